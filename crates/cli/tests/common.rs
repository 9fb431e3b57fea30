// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// The `msync` binary with environment overrides cleared.
pub fn msync() -> Command {
    let mut cmd = cargo_bin_cmd!("msync");
    cmd.env_remove("MSYNC_DATA_DIR")
        .env_remove("MSYNC_API_URL")
        .env_remove("MSYNC_PUSH_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create an initialized temp directory with default URLs
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    msync()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Runs `msync` in `temp` and returns stdout.
pub fn stdout_of(temp: &TempDir, args: &[&str]) -> String {
    let output = msync().args(args).current_dir(temp.path()).output().unwrap();
    assert!(
        output.status.success(),
        "msync {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}
