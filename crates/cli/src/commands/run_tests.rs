// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use ms_core::{Database, QueueStatus};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use super::{acquire_lock, serve};
use crate::commands::testing::TestContext;
use crate::config::{Config, DEFAULT_API_URL};
use crate::error::Error;

#[test]
fn test_second_lock_is_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("msync.lock");

    let _held = acquire_lock(&path).unwrap();
    let err = acquire_lock(&path).unwrap_err();

    assert!(matches!(err, Error::AlreadyRunning(p) if p.ends_with("msync.lock")));
}

#[test]
fn test_lock_released_on_drop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("msync.lock");

    drop(acquire_lock(&path).unwrap());
    assert!(acquire_lock(&path).is_ok());
}

#[tokio::test]
async fn test_offline_serve_stops_on_cancel() {
    let db = Database::open_in_memory().unwrap().into_shared();
    let config = Config::new(DEFAULT_API_URL).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    serve(db, &config, true, cancel).await.unwrap();
}

#[tokio::test]
async fn test_offline_serve_keeps_queue_untouched() {
    let ctx = TestContext::new();
    let id = ctx.enqueue_update("job-1", "A");
    let cancel = CancellationToken::new();
    cancel.cancel();

    serve(ctx.db.clone(), &ctx.config, true, cancel).await.unwrap();

    let item = ctx.queue.get(id).unwrap();
    assert_eq!(item.status, QueueStatus::Pending);
    assert_eq!(item.retry_count, 0);
}

#[tokio::test]
async fn test_offline_serve_skips_push() {
    // Nothing listens on the discard port; an offline run must not try it.
    let db = Database::open_in_memory().unwrap().into_shared();
    let mut config = Config::new(DEFAULT_API_URL).unwrap();
    config.push.url = Some("ws://127.0.0.1:9/push".to_string());
    let cancel = CancellationToken::new();
    cancel.cancel();

    serve(db, &config, true, cancel).await.unwrap();
}
