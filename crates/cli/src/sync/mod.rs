// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync engine.
//!
//! # Architecture
//!
//! ```text
//!   action ──► Interceptor ──online──► Dispatcher ──► Transport ──► server
//!                 │                        ▲    │
//!              offline                     │    └──► Store (confirmed)
//!                 ▼                        │
//!          OperationQueue ──drain──► Replayer
//!                 │                        ▲
//!                 └──► Store (optimistic)  │
//!                                 ConnectivityMonitor (false → true)
//!
//!   server ──► PushChannel ──► PushSubscription ──► Store (upsert)
//! ```
//!
//! # Features
//!
//! - Queueable actions issued offline are persisted, then applied
//!   optimistically, then acknowledged as deferred
//! - Queue drained in enqueue order on reconnect, one item at a time, with a
//!   retry ceiling and per-attempt timeout
//! - Fetch responses cached with a TTL and served when the network is not
//! - Push channel with automatic reconnect and exponential backoff
//! - Injectable transport, push channel and health check traits for testing

mod connectivity;
mod dispatch;
mod engine;
mod intercept;
mod push;
mod replay;
mod transport;

pub use connectivity::{
    spawn_probe, ConnectivityMonitor, ConnectivitySubscription, HealthCheck, HttpHealthCheck,
};
pub use dispatch::Dispatcher;
pub use engine::{Engine, EngineConfig};
pub use intercept::{DispatchOutcome, Interceptor};
pub use push::{
    listen, ConnectionConfig, PushChannel, PushError, PushResult, PushSubscription,
    WebSocketPushChannel,
};
pub use replay::{DrainReport, ReplayPolicy, Replayer, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_MAX_RETRIES};
pub use transport::{route, HttpTransport, Route, Transport, TransportError, TransportResult};

#[cfg(test)]
pub(crate) mod test_helpers;
