// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ms-core: domain types and storage for the marketsync engine
//!
//! This crate provides the action descriptors, the queueability classifier,
//! the optimistic reconciler, and the SQLite-backed operation queue and TTL
//! cache used by the `msync` engine and CLI.

pub mod action;
pub mod cache;
pub mod classify;
pub mod clock;
pub mod db;
pub mod entity;
pub mod error;
pub mod id;
pub mod queue;
pub mod reconcile;

pub use action::{Action, ActionKind, Changes, Collection, JobDraft, JobQuery};
pub use cache::{CacheEntry, TtlCache};
pub use classify::{is_queueable, parse_kind, Phase};
pub use clock::{ClockSource, ManualClock, SharedClock, Stamp, StampClock, SystemClock};
pub use db::{Database, SharedDb};
pub use entity::{Entity, SyncStatus};
pub use error::{Error, Result};
pub use queue::{OperationQueue, QueueStatus, QueuedOperation, StatusCounts};
pub use reconcile::{lock_store, EntityTable, PushEvent, SharedStore, Store};
