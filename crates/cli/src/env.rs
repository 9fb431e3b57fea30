// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `MSYNC_DATA_DIR` if set and non-empty.
pub fn data_dir() -> Option<PathBuf> {
    non_empty(vars::MSYNC_DATA_DIR).map(PathBuf::from)
}

/// Returns the value of `MSYNC_API_URL` if set and non-empty.
pub fn api_url() -> Option<String> {
    non_empty(vars::MSYNC_API_URL)
}

/// Returns the value of `MSYNC_PUSH_URL` if set and non-empty.
pub fn push_url() -> Option<String> {
    non_empty(vars::MSYNC_PUSH_URL)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
