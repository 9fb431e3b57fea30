// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue of actions captured while offline.
//!
//! Every item is written to SQLite before `enqueue` returns. Items are keyed
//! by a monotonic [`Stamp`], so replay order is enqueue order even when the
//! wall clock stalls or steps backwards.
//!
//! Status transitions:
//! - `pending -> processing` (at most one item may be processing)
//! - `processing -> pending` (failed attempt, retry count bumped)
//! - `pending | processing -> failed` (retry ceiling exceeded)
//! - `failed -> pending` (manual requeue only)
//! - any -> removed (confirmed success or manual discard)

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::action::{Action, Collection};
use crate::clock::{SharedClock, Stamp, StampClock};
use crate::db::{from_sql_int, lock, parse_db, parse_json, to_sql_int, SharedDb};
use crate::error::{Error, Result};

/// Lifecycle state of a queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    /// Waiting for the next drain pass.
    Pending,
    /// Being re-submitted right now.
    Processing,
    /// Gave up after exceeding the retry ceiling.
    Failed,
}

impl QueueStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Processing => "processing",
            QueueStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(QueueStatus::Pending),
            "processing" => Ok(QueueStatus::Processing),
            "failed" => Ok(QueueStatus::Failed),
            _ => Err(Error::InvalidQueueStatus(s.to_string())),
        }
    }
}

/// An action persisted for later replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    pub id: Stamp,
    pub operation: Action,
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: u32,
    pub status: QueueStatus,
}

/// Number of queued items in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.failed
    }
}

const SELECT_COLUMNS: &str = "SELECT id, operation, enqueued_ms, retry_count, status FROM queued_ops";

fn row_to_operation(row: &Row<'_>) -> std::result::Result<QueuedOperation, rusqlite::Error> {
    let id: String = row.get(0)?;
    let operation: String = row.get(1)?;
    let enqueued_ms: i64 = row.get(2)?;
    let retry_count: i64 = row.get(3)?;
    let status: String = row.get(4)?;

    Ok(QueuedOperation {
        id: parse_db(&id, "id")?,
        operation: parse_json(&operation, "operation")?,
        enqueued_at: DateTime::<Utc>::from_timestamp_millis(enqueued_ms).unwrap_or_default(),
        retry_count: u32::try_from(retry_count).unwrap_or(u32::MAX),
        status: parse_db(&status, "status")?,
    })
}

/// The durable operation queue.
///
/// Cheap to clone; clones share the database and the stamp clock.
#[derive(Clone)]
pub struct OperationQueue {
    db: SharedDb,
    stamps: Arc<StampClock<SharedClock>>,
}

impl OperationQueue {
    /// Opens the queue over a shared database.
    ///
    /// The stamp clock is advanced past every stamp already stored, so ids
    /// stay monotonic across restarts.
    pub fn new(db: SharedDb, clock: SharedClock) -> Result<Self> {
        let stamps = StampClock::with_clock(clock);
        let latest: Option<(i64, i64)> = lock(&db)
            .conn
            .query_row(
                "SELECT enqueued_ms, counter FROM queued_ops
                 ORDER BY enqueued_ms DESC, counter DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        if let Some((wall_ms, counter)) = latest {
            let counter = u32::try_from(counter).unwrap_or(u32::MAX);
            stamps.observe(Stamp::new(from_sql_int(wall_ms), counter));
        }

        Ok(OperationQueue {
            db,
            stamps: Arc::new(stamps),
        })
    }

    /// Persists a new pending item with a retry count of zero.
    pub fn enqueue(&self, operation: &Action) -> Result<QueuedOperation> {
        let json = serde_json::to_string(operation)?;
        let id = self.stamps.next();

        lock(&self.db).conn.execute(
            "INSERT INTO queued_ops (id, enqueued_ms, counter, kind, operation, retry_count, status)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 'pending')",
            params![
                id.to_string(),
                to_sql_int(id.wall_ms),
                id.counter,
                operation.kind().as_str(),
                json,
            ],
        )?;

        Ok(QueuedOperation {
            id,
            operation: operation.clone(),
            enqueued_at: id.to_datetime(),
            retry_count: 0,
            status: QueueStatus::Pending,
        })
    }

    /// Pending items in enqueue order.
    pub fn list_pending(&self) -> Result<Vec<QueuedOperation>> {
        self.list_where("status = 'pending'")
    }

    /// Items that exceeded the retry ceiling, in enqueue order.
    pub fn list_failed(&self) -> Result<Vec<QueuedOperation>> {
        self.list_where("status = 'failed'")
    }

    /// Items whose optimistic change is still outstanding (pending or
    /// processing), in enqueue order.
    pub fn list_unconfirmed(&self) -> Result<Vec<QueuedOperation>> {
        self.list_where("status IN ('pending', 'processing')")
    }

    /// Every item regardless of status, in enqueue order.
    pub fn list_all(&self) -> Result<Vec<QueuedOperation>> {
        self.list_where("1 = 1")
    }

    fn list_where(&self, condition: &str) -> Result<Vec<QueuedOperation>> {
        let db = lock(&self.db);
        let sql = format!("{SELECT_COLUMNS} WHERE {condition} ORDER BY enqueued_ms, counter");
        let mut stmt = db.conn.prepare(&sql)?;
        let items = stmt
            .query_map([], row_to_operation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Looks up a single item.
    pub fn get(&self, id: Stamp) -> Result<QueuedOperation> {
        let db = lock(&self.db);
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        db.conn
            .query_row(&sql, [id.to_string()], row_to_operation)
            .optional()?
            .ok_or_else(|| Error::OperationNotFound(id.to_string()))
    }

    /// Claims a pending item for replay.
    ///
    /// Fails if the item is not pending or another item is already processing.
    pub fn mark_processing(&self, id: Stamp) -> Result<()> {
        let db = lock(&self.db);
        let changed = db.conn.execute(
            "UPDATE queued_ops SET status = 'processing'
             WHERE id = ?1 AND status = 'pending'
               AND NOT EXISTS (SELECT 1 FROM queued_ops WHERE status = 'processing')",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(transition_error(&db.conn, id, QueueStatus::Processing));
        }
        Ok(())
    }

    /// Returns a processing item to pending after a failed attempt.
    pub fn mark_pending(&self, id: Stamp, retry_count: u32) -> Result<()> {
        let db = lock(&self.db);
        let changed = db.conn.execute(
            "UPDATE queued_ops SET status = 'pending', retry_count = ?2
             WHERE id = ?1 AND status = 'processing'",
            params![id.to_string(), retry_count],
        )?;
        if changed == 0 {
            return Err(transition_error(&db.conn, id, QueueStatus::Pending));
        }
        Ok(())
    }

    /// Moves an item to its terminal failed state.
    pub fn mark_failed(&self, id: Stamp, retry_count: u32) -> Result<()> {
        let db = lock(&self.db);
        let changed = db.conn.execute(
            "UPDATE queued_ops SET status = 'failed', retry_count = ?2
             WHERE id = ?1 AND status IN ('pending', 'processing')",
            params![id.to_string(), retry_count],
        )?;
        if changed == 0 {
            return Err(transition_error(&db.conn, id, QueueStatus::Failed));
        }
        Ok(())
    }

    /// Deletes an item. Returns false if it was already gone.
    pub fn remove(&self, id: Stamp) -> Result<bool> {
        let changed = lock(&self.db)
            .conn
            .execute("DELETE FROM queued_ops WHERE id = ?1", [id.to_string()])?;
        Ok(changed > 0)
    }

    /// Deletes an item on operator request.
    pub fn discard(&self, id: Stamp) -> Result<()> {
        if !self.remove(id)? {
            return Err(Error::OperationNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Gives a failed item a fresh set of attempts.
    pub fn requeue(&self, id: Stamp) -> Result<()> {
        let db = lock(&self.db);
        let changed = db.conn.execute(
            "UPDATE queued_ops SET status = 'pending', retry_count = 0
             WHERE id = ?1 AND status = 'failed'",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(transition_error(&db.conn, id, QueueStatus::Pending));
        }
        Ok(())
    }

    /// Rewrites waiting items that target `from` so they target `to`.
    ///
    /// Used once the server confirms a create under a different id than the
    /// provisional one. Pending and failed items are rewritten; the item
    /// being replayed is left alone. Returns how many items changed.
    pub fn retarget(&self, collection: Collection, from: &str, to: &str) -> Result<usize> {
        let db = lock(&self.db);
        let tx = db.conn.unchecked_transaction()?;
        let rows: Vec<(String, String)> = {
            let mut stmt = tx.prepare(
                "SELECT id, operation FROM queued_ops WHERE status IN ('pending', 'failed')",
            )?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let mut changed = 0;
        for (id, json) in rows {
            let mut operation: Action = serde_json::from_str(&json)?;
            if operation.retarget(collection, from, to) {
                tx.execute(
                    "UPDATE queued_ops SET operation = ?2 WHERE id = ?1",
                    params![id, serde_json::to_string(&operation)?],
                )?;
                changed += 1;
            }
        }
        tx.commit()?;
        Ok(changed)
    }

    /// Deletes every failed item. Returns how many were deleted.
    pub fn clear_failed(&self) -> Result<usize> {
        let changed = lock(&self.db)
            .conn
            .execute("DELETE FROM queued_ops WHERE status = 'failed'", [])?;
        Ok(changed)
    }

    /// Returns items left processing by an interrupted drain to pending.
    pub fn reset_processing(&self) -> Result<usize> {
        let changed = lock(&self.db).conn.execute(
            "UPDATE queued_ops SET status = 'pending' WHERE status = 'processing'",
            [],
        )?;
        Ok(changed)
    }

    pub fn count_by_status(&self) -> Result<StatusCounts> {
        let db = lock(&self.db);
        let mut stmt = db
            .conn
            .prepare("SELECT status, COUNT(*) FROM queued_ops GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((parse_db::<QueueStatus>(&status, "status")?, count))
        })?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, count) = row?;
            let count = usize::try_from(count).unwrap_or(0);
            match status {
                QueueStatus::Pending => counts.pending = count,
                QueueStatus::Processing => counts.processing = count,
                QueueStatus::Failed => counts.failed = count,
            }
        }
        Ok(counts)
    }
}

/// Explains why a guarded status update changed no rows.
fn transition_error(conn: &Connection, id: Stamp, to: QueueStatus) -> Error {
    let current: Option<String> = conn
        .query_row(
            "SELECT status FROM queued_ops WHERE id = ?1",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()
        .unwrap_or(None);

    let Some(from) = current else {
        return Error::OperationNotFound(id.to_string());
    };

    if to == QueueStatus::Processing && from == QueueStatus::Pending.as_str() {
        let other: Option<String> = conn
            .query_row(
                "SELECT id FROM queued_ops WHERE status = 'processing' LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .unwrap_or(None);
        if let Some(other) = other {
            return Error::AlreadyProcessing(other);
        }
    }

    Error::InvalidQueueTransition {
        id: id.to_string(),
        from,
        to: to.to_string(),
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
