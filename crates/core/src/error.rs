// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for ms-core operations.

use thiserror::Error;

/// All possible errors that can occur in ms-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("queued operation not found: {0}")]
    OperationNotFound(String),

    #[error("cannot move operation {id} from {from} to {to}")]
    InvalidQueueTransition {
        id: String,
        from: String,
        to: String,
    },

    #[error("another operation is already processing: {0}\n  hint: only one drain pass may run at a time")]
    AlreadyProcessing(String),

    #[error("invalid action kind: '{0}'\n  hint: kinds look like 'jobs/updateJob' or 'jobs/updateJob/pending'")]
    InvalidActionKind(String),

    #[error("invalid queue status: '{0}'\n  hint: valid statuses are: pending, processing, failed")]
    InvalidQueueStatus(String),

    #[error("invalid sync status: '{0}'\n  hint: valid statuses are: synced, pending, failed")]
    InvalidSyncStatus(String),

    #[error("invalid collection: '{0}'\n  hint: valid collections are: jobs, messages, profiles")]
    InvalidCollection(String),

    #[error("invalid stamp: {0}")]
    InvalidStamp(String),

    #[error("invalid entity snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for ms-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
