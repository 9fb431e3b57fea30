// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod cache;
pub mod dispatch;
pub mod init;
pub mod queue;
pub mod run;
pub mod status;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use ms_core::{Database, SharedClock, SharedDb, Stamp, SystemClock};

use crate::config::{db_path, find_config_dir, get_data_dir, Config};
use crate::error::{Error, Result};

/// The current project's configuration and where its state lives.
pub struct Context {
    pub config: Config,
    pub data_dir: PathBuf,
}

/// Finds and loads the configuration for the current directory.
pub fn load_context() -> Result<Context> {
    let config_dir = find_config_dir()?;
    let config = Config::load(&config_dir)?.with_env_overrides()?;
    let data_dir = get_data_dir(&config_dir, &config);
    Ok(Context { config, data_dir })
}

/// Helper to open the database from the current context.
pub fn open_db() -> Result<(SharedDb, Context)> {
    let ctx = load_context()?;
    let db = Database::open(&db_path(&ctx.data_dir))?.into_shared();
    Ok((db, ctx))
}

pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

/// Parses a queue id as printed by `msync queue list`.
pub fn parse_queue_id(id: &str) -> Result<Stamp> {
    Stamp::parse(id).map_err(|_| Error::InvalidQueueId(id.to_string()))
}
