// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite storage shared by the operation queue and the TTL cache.
//!
//! One [`Database`] holds a single connection. The queue and the cache share
//! it through [`SharedDb`] and hold the lock only for the duration of a
//! statement, so every write is on disk before the call returns.

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};

/// SQL schema for the sync database.
pub const SCHEMA: &str = r#"
-- Durable operation queue
CREATE TABLE IF NOT EXISTS queued_ops (
    id TEXT PRIMARY KEY,             -- stamp, "{wall_ms}-{counter}"
    enqueued_ms INTEGER NOT NULL,
    counter INTEGER NOT NULL,
    kind TEXT NOT NULL,
    operation TEXT NOT NULL,         -- JSON action descriptor
    retry_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending'
);

-- Read cache with per-entry expiry
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    written_ms INTEGER NOT NULL,
    ttl_ms INTEGER NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_queued_ops_status ON queued_ops(status, enqueued_ms, counter);
CREATE INDEX IF NOT EXISTS idx_cache_written ON cache_entries(written_ms);
"#;

/// Parse a string value from the database, returning a rusqlite error on parse failure.
pub(crate) fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse a JSON column from the database.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    serde_json::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid JSON in column '{column}': {e}"
            ))),
        )
    })
}

/// Convert an unsigned value to SQLite's signed integer.
pub(crate) fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Convert SQLite's signed integer back to an unsigned value.
pub(crate) fn from_sql_int(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Run all migrations on the database.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Database handle shared between the queue and the cache.
pub type SharedDb = Arc<Mutex<Database>>;

/// Database connection wrapper.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL so the CLI can inspect the queue while the engine runs
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Wraps the database for sharing.
    pub fn into_shared(self) -> SharedDb {
        Arc::new(Mutex::new(self))
    }
}

/// Locks a shared database, recovering from a poisoned lock.
///
/// A panic while holding the lock cannot leave SQLite half-written, so the
/// connection stays usable.
pub fn lock(db: &SharedDb) -> MutexGuard<'_, Database> {
    db.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
