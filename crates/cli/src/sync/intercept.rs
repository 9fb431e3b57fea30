// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point for every user action.
//!
//! Online, actions go straight to the dispatcher. Offline, queueable actions
//! are persisted, applied optimistically, and acknowledged as deferred
//! without touching the network. Everything else is sent anyway and fails
//! the way it naturally would.

use ms_core::{lock_store, Action, OperationQueue, SharedStore, Stamp, TtlCache};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::connectivity::ConnectivityMonitor;
use super::dispatch::Dispatcher;
use super::transport::{Transport, TransportResult};

/// What happened to a dispatched action.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The server answered.
    Completed(Value),
    /// Persisted for replay; the local state already shows the change.
    Deferred { queue_id: Stamp },
    /// The server was not asked or did not answer; a fresh cached copy was
    /// served instead.
    Cached(Value),
}

impl DispatchOutcome {
    pub fn is_deferred(&self) -> bool {
        matches!(self, DispatchOutcome::Deferred { .. })
    }
}

/// Routes actions between the network and the offline queue.
pub struct Interceptor<T: Transport> {
    dispatcher: Dispatcher<T>,
    queue: OperationQueue,
    cache: TtlCache,
    connectivity: ConnectivityMonitor,
}

impl<T: Transport> Interceptor<T> {
    pub fn new(
        dispatcher: Dispatcher<T>,
        queue: OperationQueue,
        cache: TtlCache,
        connectivity: ConnectivityMonitor,
    ) -> Self {
        Interceptor {
            dispatcher,
            queue,
            cache,
            connectivity,
        }
    }

    pub fn store(&self) -> &SharedStore {
        self.dispatcher.store()
    }

    /// Dispatches an action, deferring it if offline and queueable.
    ///
    /// The queue write completes before the optimistic update. If the write
    /// fails the action is sent to the network as if online.
    pub async fn dispatch(&self, action: Action) -> TransportResult<DispatchOutcome> {
        let kind = action.kind();
        if !self.connectivity.is_online() && kind.is_queueable() {
            match self.queue.enqueue(&action) {
                Ok(item) => {
                    lock_store(self.dispatcher.store()).apply_action_optimistic(&action);
                    info!(%kind, queue_id = %item.id, "offline, action deferred");
                    return Ok(DispatchOutcome::Deferred { queue_id: item.id });
                }
                Err(e) => {
                    warn!(%kind, error = %e, "could not persist offline action, sending anyway");
                }
            }
        }

        let result = self.dispatcher.submit(&action).await?;
        Ok(DispatchOutcome::Completed(result))
    }

    /// Read-through dispatch for fetches.
    ///
    /// Offline, a fresh cache entry is served without a request. Online, the
    /// response is cached and a fresh entry is the fallback when the request
    /// fails. Non-read actions go through [`Interceptor::dispatch`].
    pub async fn fetch(&self, action: Action) -> TransportResult<DispatchOutcome> {
        let Some(key) = action.cache_key() else {
            return self.dispatch(action).await;
        };

        if !self.connectivity.is_online() {
            if let Some(cached) = self.cached(&key) {
                return Ok(DispatchOutcome::Cached(cached));
            }
        }

        match self.dispatcher.submit(&action).await {
            Ok(value) => {
                if let Err(e) = self.cache.put_default(&key, &value) {
                    warn!(%key, error = %e, "failed to cache response");
                }
                Ok(DispatchOutcome::Completed(value))
            }
            Err(err) => match self.cached(&key) {
                Some(cached) => {
                    debug!(%key, error = %err, "request failed, serving cached copy");
                    Ok(DispatchOutcome::Cached(cached))
                }
                None => Err(err),
            },
        }
    }

    /// Returns a fresh cache entry. Cached copies never reach the store.
    fn cached(&self, key: &str) -> Option<Value> {
        match self.cache.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "cache read failed");
                None
            }
        }
    }
}
