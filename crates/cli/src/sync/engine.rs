// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The assembled sync engine.
//!
//! [`Engine::open`] wires the queue, cache, reconciler, dispatcher,
//! interceptor and replayer over one database and one transport, and
//! restores optimistic state left behind by the previous session.
//! [`Engine::run`] is the event loop: it drains on reconnect and on a timer,
//! sweeps the cache, and merges push events until cancelled.

use std::sync::Arc;
use std::time::Duration;

use ms_core::{
    lock_store, Action, OperationQueue, SharedClock, SharedDb, SharedStore, Store, TtlCache,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connectivity::ConnectivityMonitor;
use super::dispatch::Dispatcher;
use super::intercept::{DispatchOutcome, Interceptor};
use super::push::PushSubscription;
use super::replay::{DrainReport, ReplayPolicy, Replayer};
use super::transport::{Transport, TransportResult};

/// Timing and limits for an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Periodic drain while online, in addition to reconnect edges.
    pub drain_interval: Duration,
    /// How often expired cache entries are swept.
    pub sweep_interval: Duration,
    pub policy: ReplayPolicy,
    /// TTL for cached fetch responses.
    pub default_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            drain_interval: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(60),
            policy: ReplayPolicy::default(),
            default_ttl: Duration::from_secs(300),
        }
    }
}

pub struct Engine<T: Transport> {
    queue: OperationQueue,
    cache: TtlCache,
    store: SharedStore,
    connectivity: ConnectivityMonitor,
    interceptor: Interceptor<T>,
    replayer: Replayer<T>,
    config: EngineConfig,
}

impl<T: Transport> Engine<T> {
    /// Builds an engine over an open database.
    ///
    /// Items a crashed drain left processing go back to pending, and every
    /// unconfirmed item's optimistic change is re-applied so the store shows
    /// what the user last saw.
    pub fn open(
        db: SharedDb,
        clock: SharedClock,
        transport: Arc<T>,
        connectivity: ConnectivityMonitor,
        config: EngineConfig,
    ) -> ms_core::Result<Self> {
        let queue = OperationQueue::new(db.clone(), clock.clone())?;
        let cache = TtlCache::new(db, clock, config.default_ttl);

        let reset = queue.reset_processing()?;
        if reset > 0 {
            info!(count = reset, "recovered interrupted replays");
        }

        let store = Store::shared();
        let unconfirmed = queue.list_unconfirmed()?;
        {
            let mut store = lock_store(&store);
            for item in &unconfirmed {
                store.apply_action_optimistic(&item.operation);
            }
        }
        if !unconfirmed.is_empty() {
            info!(count = unconfirmed.len(), "restored optimistic state");
        }

        let dispatcher = Dispatcher::new(transport, Arc::clone(&store));
        let interceptor = Interceptor::new(
            dispatcher.clone(),
            queue.clone(),
            cache.clone(),
            connectivity.clone(),
        );
        let replayer = Replayer::new(dispatcher, queue.clone(), config.policy);

        Ok(Engine {
            queue,
            cache,
            store,
            connectivity,
            interceptor,
            replayer,
            config,
        })
    }

    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn replayer(&self) -> &Replayer<T> {
        &self.replayer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn dispatch(&self, action: Action) -> TransportResult<DispatchOutcome> {
        self.interceptor.dispatch(action).await
    }

    pub async fn fetch(&self, action: Action) -> TransportResult<DispatchOutcome> {
        self.interceptor.fetch(action).await
    }

    pub async fn drain(&self) -> ms_core::Result<DrainReport> {
        self.replayer.drain().await
    }

    /// Runs until `cancel` fires.
    ///
    /// Drains once at start if online, then on every offline-to-online edge
    /// and every drain interval while online. Push events, when a
    /// subscription is given, are merged into the store as they arrive.
    pub async fn run(&self, mut push: Option<PushSubscription>, cancel: CancellationToken) {
        let mut edges = self.connectivity.subscribe();
        let mut drain_tick = tokio::time::interval(self.config.drain_interval);
        drain_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sweep_tick = tokio::time::interval(self.config.sweep_interval);
        sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial drain is explicit.
        drain_tick.tick().await;
        sweep_tick.tick().await;

        if self.connectivity.is_online() {
            self.drain_logged().await;
        }

        info!("sync engine running");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                edge = edges.changed() => match edge {
                    Some(true) => {
                        info!("back online");
                        self.drain_logged().await;
                    }
                    Some(false) => info!("offline, queueing eligible actions"),
                    None => break,
                },
                _ = drain_tick.tick() => {
                    if self.connectivity.is_online() {
                        self.drain_logged().await;
                    }
                }
                _ = sweep_tick.tick() => match self.cache.sweep() {
                    Ok(0) => {}
                    Ok(evicted) => debug!(evicted, "swept expired cache entries"),
                    Err(e) => warn!(error = %e, "cache sweep failed"),
                },
                event = next_push(&mut push) => match event {
                    Some(event) => {
                        let collection = event.collection();
                        if let Err(e) = lock_store(&self.store).apply_push(&event) {
                            warn!(%collection, error = %e, "ignoring push event");
                        }
                    }
                    None => {
                        warn!("push listener stopped");
                        push = None;
                    }
                },
            }
        }

        if let Some(push) = push {
            if let Err(e) = push.close().await {
                debug!(error = %e, "push listener ended with error");
            }
        }
        info!("sync engine stopped");
    }

    async fn drain_logged(&self) {
        if let Err(e) = self.replayer.drain().await {
            warn!(error = %e, "drain failed");
        }
    }
}

/// Next push event, or pending forever without a subscription.
async fn next_push(push: &mut Option<PushSubscription>) -> Option<ms_core::PushEvent> {
    match push {
        Some(push) => push.recv().await,
        None => std::future::pending().await,
    }
}
