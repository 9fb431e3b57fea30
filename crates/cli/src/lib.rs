// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! msrs - offline-first sync engine for the marketplace client.
//!
//! This crate provides the engine behind the `msync` CLI: it routes client
//! actions to the REST API, queues eligible writes while offline, replays
//! them in order on reconnect, caches reads with a TTL, and merges server
//! pushes into the local entity store.
//!
//! # Main Components
//!
//! - [`sync::Engine`] - Owns the queue, cache and store and runs the
//!   reconnect/drain/sweep/push loop
//! - [`sync::Interceptor`] - Decides per action whether to send, queue or
//!   serve from cache
//! - [`sync::Replayer`] - Drains the queue against the server with a retry
//!   ceiling
//! - [`Config`] - Project configuration in `.msync/config.toml`
//! - [`Error`] - Error types for all operations
//!
//! # Embedding
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ms_core::{Action, Database, SystemClock};
//! use msrs::sync::{ConnectivityMonitor, Engine, EngineConfig, HttpTransport};
//!
//! let db = Database::open(&path)?.into_shared();
//! let transport = Arc::new(HttpTransport::new(api_url, timeout)?);
//! let engine = Engine::open(db, Arc::new(SystemClock), transport,
//!     ConnectivityMonitor::new(true), EngineConfig::default())?;
//! let outcome = engine.dispatch(Action::update_job("job-1", changes)).await?;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod env;
pub mod error;
pub mod sync;

pub use cli::{CacheCommand, Cli, Command, OutputFormat, QueueCommand};
pub use config::{find_config_dir, get_data_dir, init_config_dir, Config};
pub use error::{Error, Result};

/// Runs a parsed CLI command.
pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Init {
            api_url,
            push_url,
            path,
        } => commands::init::run(api_url, push_url, path),
        Command::Status { output } => commands::status::run(output),
        Command::Queue(cmd) => commands::queue::run(cmd),
        Command::Cache(cmd) => commands::cache::run(cmd),
        Command::Dispatch {
            action,
            offline,
            output,
        } => commands::dispatch::run(&action, offline, output),
        Command::Run { offline } => commands::run::run(offline),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
