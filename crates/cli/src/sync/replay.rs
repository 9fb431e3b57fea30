// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Replays the offline queue.
//!
//! A drain walks pending items in enqueue order and re-submits each through
//! the same dispatch path live actions use. Items are replayed one at a time;
//! a failing item is rescheduled or retired without stopping the pass.

use std::sync::Arc;
use std::time::Duration;

use ms_core::{lock_store, OperationQueue, QueuedOperation};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::dispatch::Dispatcher;
use super::transport::{Transport, TransportError, TransportResult};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default bound on a single replay attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);

/// Limits applied while replaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayPolicy {
    /// Retries allowed before an item is marked failed.
    pub max_retries: u32,
    /// Time allowed for one attempt; a timeout counts as a failure.
    pub attempt_timeout: Duration,
}

impl Default for ReplayPolicy {
    fn default() -> Self {
        ReplayPolicy {
            max_retries: DEFAULT_MAX_RETRIES,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// Summary of a single drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// Failed attempts put back to pending.
    pub retried: usize,
    /// Items that hit the retry ceiling during this pass.
    pub failed: usize,
    /// True if another drain was already running and this one did nothing.
    pub skipped: bool,
}

impl DrainReport {
    fn skipped() -> Self {
        DrainReport {
            skipped: true,
            ..DrainReport::default()
        }
    }
}

/// Outcome of replaying one item.
enum Replayed {
    Succeeded,
    Retried,
    Failed,
}

/// Drains the operation queue through a dispatcher.
pub struct Replayer<T: Transport> {
    dispatcher: Dispatcher<T>,
    queue: OperationQueue,
    guard: Arc<Mutex<()>>,
    policy: ReplayPolicy,
}

impl<T: Transport> Clone for Replayer<T> {
    fn clone(&self) -> Self {
        Replayer {
            dispatcher: self.dispatcher.clone(),
            queue: self.queue.clone(),
            guard: Arc::clone(&self.guard),
            policy: self.policy,
        }
    }
}

impl<T: Transport> Replayer<T> {
    pub fn new(dispatcher: Dispatcher<T>, queue: OperationQueue, policy: ReplayPolicy) -> Self {
        Replayer {
            dispatcher,
            queue,
            guard: Arc::new(Mutex::new(())),
            policy,
        }
    }

    pub fn policy(&self) -> ReplayPolicy {
        self.policy
    }

    /// Replays every pending item once.
    ///
    /// Only one drain runs at a time across all clones; a concurrent call
    /// returns immediately with [`DrainReport::skipped`] set. Items enqueued
    /// after the pass starts wait for the next one. Storage errors on
    /// individual items are logged and the pass moves on; only failing to
    /// read the pending list aborts it.
    pub async fn drain(&self) -> ms_core::Result<DrainReport> {
        let Ok(_guard) = self.guard.try_lock() else {
            debug!("drain already in progress, skipping");
            return Ok(DrainReport::skipped());
        };

        // Holding the guard, nothing of ours is mid-replay; anything still
        // processing was stranded by an earlier bookkeeping failure.
        match self.queue.reset_processing() {
            Ok(0) => {}
            Ok(count) => warn!(count, "released items stranded in processing"),
            Err(e) => warn!(error = %e, "could not release stranded items"),
        }

        let pending = self.queue.list_pending()?;
        if pending.is_empty() {
            return Ok(DrainReport::default());
        }
        info!(count = pending.len(), "draining offline queue");

        let mut report = DrainReport::default();
        for item in pending {
            match self.replay_one(&item).await {
                Ok(Some(outcome)) => {
                    report.attempted += 1;
                    match outcome {
                        Replayed::Succeeded => report.succeeded += 1,
                        Replayed::Retried => report.retried += 1,
                        Replayed::Failed => report.failed += 1,
                    }
                }
                Ok(None) => {}
                Err(ms_core::Error::AlreadyProcessing(stuck)) => {
                    warn!(
                        queue_id = %item.id,
                        stuck = %stuck,
                        "queue blocked by an item stuck in processing, ending pass"
                    );
                    break;
                }
                Err(e) => warn!(queue_id = %item.id, error = %e, "replay bookkeeping failed"),
            }
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            retried = report.retried,
            failed = report.failed,
            "drain finished"
        );
        Ok(report)
    }

    /// Replays one item. Returns `None` if the item was no longer pending.
    ///
    /// If recording the outcome fails, the item is put back to pending so it
    /// does not hold the processing slot.
    async fn replay_one(&self, item: &QueuedOperation) -> ms_core::Result<Option<Replayed>> {
        match self.queue.mark_processing(item.id) {
            Ok(()) => {}
            Err(ms_core::Error::OperationNotFound(_))
            | Err(ms_core::Error::InvalidQueueTransition { .. }) => {
                debug!(queue_id = %item.id, "item left the pending state, skipping");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        // Re-read: an earlier item in this pass may have retargeted it.
        let item = match self.queue.get(item.id) {
            Ok(current) => current,
            Err(e) => {
                self.release(item);
                return Err(e);
            }
        };

        let result = self.attempt(&item).await;
        match self.settle(&item, result) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                self.release(&item);
                Err(e)
            }
        }
    }

    fn release(&self, item: &QueuedOperation) {
        if let Err(e) = self.queue.mark_pending(item.id, item.retry_count) {
            warn!(queue_id = %item.id, error = %e, "could not release item");
        }
    }

    /// Records the result of an attempt on a processing item.
    fn settle(
        &self,
        item: &QueuedOperation,
        result: TransportResult<Value>,
    ) -> ms_core::Result<Replayed> {
        let kind = item.operation.kind();
        match result {
            Ok(value) => {
                self.queue.remove(item.id)?;
                debug!(queue_id = %item.id, %kind, "replayed");
                self.follow_reassigned_id(item, &value);
                Ok(Replayed::Succeeded)
            }
            Err(err) => {
                let retry_count = item.retry_count.saturating_add(1);
                if retry_count > self.policy.max_retries {
                    self.queue.mark_failed(item.id, retry_count)?;
                    if let Some((collection, id)) = item.operation.target() {
                        lock_store(self.dispatcher.store()).mark_failed(collection, id);
                    }
                    warn!(
                        queue_id = %item.id,
                        %kind,
                        retry_count,
                        error = %err,
                        "giving up on queued action"
                    );
                    Ok(Replayed::Failed)
                } else {
                    self.queue.mark_pending(item.id, retry_count)?;
                    debug!(
                        queue_id = %item.id,
                        %kind,
                        retry_count,
                        transient = err.is_transient(),
                        error = %err,
                        "replay failed, will retry"
                    );
                    Ok(Replayed::Retried)
                }
            }
        }
    }

    /// Points queued follow-ups of a create at the id the server assigned.
    ///
    /// The create itself is already confirmed, so a failure here is logged
    /// rather than reported as a replay failure.
    fn follow_reassigned_id(&self, item: &QueuedOperation, result: &Value) {
        let (Some((collection, provisional)), Some(server_id)) =
            (item.operation.target(), item.operation.reassigned_id(result))
        else {
            return;
        };
        match self.queue.retarget(collection, provisional, server_id) {
            Ok(0) => {}
            Ok(count) => info!(
                %collection,
                provisional,
                server_id,
                count,
                "retargeted queued actions to server id"
            ),
            Err(e) => warn!(
                %collection,
                provisional,
                server_id,
                error = %e,
                "could not retarget queued actions"
            ),
        }
    }

    async fn attempt(&self, item: &QueuedOperation) -> TransportResult<Value> {
        let limit = self.policy.attempt_timeout;
        match tokio::time::timeout(limit, self.dispatcher.submit(&item.operation)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(limit)),
        }
    }
}
