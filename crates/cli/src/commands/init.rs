// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::{Path, PathBuf};

use ms_core::Database;

use crate::config::{db_path, init_config_dir, resolve_data_dir, Config, DEFAULT_API_URL};
use crate::env;
use crate::error::Result;

pub fn run(api_url: Option<String>, push_url: Option<String>, path: Option<String>) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };
    run_impl(
        api_url.as_deref(),
        push_url,
        &target_path,
        env::data_dir(),
        &mut std::io::stdout(),
    )
}

pub(crate) fn run_impl(
    api_url: Option<&str>,
    push_url: Option<String>,
    target_path: &Path,
    env_data_dir: Option<PathBuf>,
    out: &mut impl Write,
) -> Result<()> {
    let mut config = Config::new(api_url.unwrap_or(DEFAULT_API_URL))?;
    config.push.url = push_url;
    config.validate()?;

    let config_dir = init_config_dir(target_path, &config)?;

    // Create the schema up front so `status` works before the first run
    let data_dir = resolve_data_dir(&config_dir, &config, env_data_dir);
    Database::open(&db_path(&data_dir))?;

    writeln!(out, "Initialized sync state at {}", config_dir.display())?;
    writeln!(out, "API: {}", config.api_url)?;
    match &config.push.url {
        Some(url) => writeln!(out, "Push: {}", url)?,
        None => writeln!(out, "Push: disabled (set with --push-url)")?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
