// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read cache with per-entry time-to-live.
//!
//! An entry is valid while `now - written_at <= ttl`. Reads of an expired
//! entry evict it and report a miss; [`TtlCache::sweep`] evicts everything
//! expired in one statement. Writes replace the whole value.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use std::time::Duration;

use crate::clock::SharedClock;
use crate::db::{from_sql_int, lock, parse_json, to_sql_int, SharedDb};
use crate::error::Result;

/// A cached value together with its freshness metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub data: Value,
    pub written_at: DateTime<Utc>,
    pub ttl: Duration,
}

/// SQLite-backed TTL cache.
#[derive(Clone)]
pub struct TtlCache {
    db: SharedDb,
    clock: SharedClock,
    default_ttl: Duration,
}

fn duration_ms(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

impl TtlCache {
    pub fn new(db: SharedDb, clock: SharedClock, default_ttl: Duration) -> Self {
        TtlCache {
            db,
            clock,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Stores `data` under `key`, replacing any previous value.
    pub fn put(&self, key: &str, data: &Value, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(data)?;
        let now = to_sql_int(self.clock.now_ms());
        lock(&self.db).conn.execute(
            "INSERT INTO cache_entries (key, data, written_ms, ttl_ms) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                data = excluded.data,
                written_ms = excluded.written_ms,
                ttl_ms = excluded.ttl_ms",
            params![key, json, now, duration_ms(ttl)],
        )?;
        Ok(())
    }

    /// Stores `data` with the configured default TTL.
    pub fn put_default(&self, key: &str, data: &Value) -> Result<()> {
        self.put(key, data, self.default_ttl)
    }

    /// Returns the cached value if it is still fresh.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.get_entry(key)?.map(|entry| entry.data))
    }

    /// Returns the fresh entry for `key`, evicting it if expired.
    pub fn get_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        let now = to_sql_int(self.clock.now_ms());
        let db = lock(&self.db);
        let row: Option<(String, i64, i64)> = db
            .conn
            .query_row(
                "SELECT data, written_ms, ttl_ms FROM cache_entries WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((data, written_ms, ttl_ms)) = row else {
            return Ok(None);
        };

        if now.saturating_sub(written_ms) > ttl_ms {
            db.conn
                .execute("DELETE FROM cache_entries WHERE key = ?1", [key])?;
            return Ok(None);
        }

        Ok(Some(CacheEntry {
            key: key.to_string(),
            data: parse_json(&data, "data")?,
            written_at: DateTime::<Utc>::from_timestamp_millis(written_ms).unwrap_or_default(),
            ttl: Duration::from_millis(from_sql_int(ttl_ms)),
        }))
    }

    /// Removes an entry. Returns true if it existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let changed = lock(&self.db)
            .conn
            .execute("DELETE FROM cache_entries WHERE key = ?1", [key])?;
        Ok(changed > 0)
    }

    /// Evicts every expired entry and returns how many were evicted.
    pub fn sweep(&self) -> Result<usize> {
        let now = to_sql_int(self.clock.now_ms());
        let evicted = lock(&self.db).conn.execute(
            "DELETE FROM cache_entries WHERE ?1 - written_ms > ttl_ms",
            [now],
        )?;
        Ok(evicted)
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = lock(&self.db)
            .conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
