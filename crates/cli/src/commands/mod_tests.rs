// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Test infrastructure for command testing without filesystem setup.
//!
//! This module provides a `TestContext` that wraps an in-memory database,
//! a manual clock and a default config, enabling commands to be tested
//! without requiring actual `.msync/` directory setup.

use std::sync::Arc;
use std::time::Duration;

use ms_core::{
    Action, Changes, Database, ManualClock, OperationQueue, SharedClock, SharedDb, Stamp,
    TtlCache,
};
use serde_json::json;

use crate::config::{Config, DEFAULT_API_URL};

pub const T0: u64 = 1_700_000_000_000;

/// Test context providing in-memory storage and default config for testing.
pub struct TestContext {
    pub db: SharedDb,
    pub config: Config,
    pub clock: Arc<ManualClock>,
    pub queue: OperationQueue,
    pub cache: TtlCache,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let db = Database::open_in_memory()
            .expect("Failed to create in-memory database")
            .into_shared();
        let config = Config::new(DEFAULT_API_URL).expect("Failed to create config");
        let clock = Arc::new(ManualClock::new(T0));
        let shared: SharedClock = Arc::clone(&clock) as SharedClock;
        let queue = OperationQueue::new(db.clone(), shared.clone()).unwrap();
        let cache = TtlCache::new(db.clone(), shared, config.default_ttl());
        TestContext {
            db,
            config,
            clock,
            queue,
            cache,
        }
    }

    /// Queues a title change to `job_id`, returning its queue id.
    pub fn enqueue_update(&self, job_id: &str, title: &str) -> Stamp {
        let mut changes = Changes::new();
        changes.insert("title".to_string(), json!(title));
        self.queue
            .enqueue(&Action::update_job(job_id, changes))
            .unwrap()
            .id
    }

    /// Queues an update and pushes it straight to the failed state.
    pub fn enqueue_failed(&self, job_id: &str, title: &str) -> Stamp {
        let id = self.enqueue_update(job_id, title);
        self.queue.mark_failed(id, 4).unwrap();
        id
    }

    pub fn cache_put(&self, key: &str, ttl_ms: u64) {
        self.cache
            .put(key, &json!({"key": key}), Duration::from_millis(ttl_ms))
            .unwrap();
    }

    /// Runs `f` and returns what it wrote.
    pub fn capture(
        &self,
        f: impl FnOnce(&mut Vec<u8>) -> crate::error::Result<()>,
    ) -> crate::error::Result<String> {
        let mut out = Vec::new();
        f(&mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }
}
