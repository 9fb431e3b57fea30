// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::{PushError, TransportError};

/// All possible errors that can occur in the msrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'msync init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("invalid queue id: '{0}'\n  hint: ids look like '1760000000000-0' (see 'msync queue list')")]
    InvalidQueueId(String),

    #[error("engine already running: lock held on {0}\n  hint: stop the other 'msync run' first")]
    AlreadyRunning(String),

    #[error("invalid action: {0}\n  hint: actions look like '{{\"kind\":\"jobs/updateJob\",\"payload\":{{\"id\":\"job-1\",\"changes\":{{}}}}}}'")]
    InvalidAction(String),

    #[error("no fresh cache entry for '{0}'")]
    CacheMiss(String),

    #[error("{0}")]
    Core(#[from] ms_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("push channel error: {0}")]
    Push(#[from] PushError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// A specialized Result type for msrs operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
