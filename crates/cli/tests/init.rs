// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;
use yare::parameterized;

#[test]
fn creates_config_dir() {
    let temp = TempDir::new().unwrap();

    msync()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized sync state"));

    assert!(temp.path().join(".msync/config.toml").exists());
    assert!(temp.path().join(".msync/sync.db").exists());
    assert!(temp.path().join(".msync/.gitignore").exists());
}

#[test]
fn fails_if_already_initialized() {
    let temp = init_temp();

    msync()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn init_with_path_flag() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("app");
    std::fs::create_dir(&target).unwrap();

    msync()
        .args(["init", "--path"])
        .arg(&target)
        .current_dir(temp.path())
        .assert()
        .success();

    assert!(target.join(".msync/config.toml").exists());
    assert!(!temp.path().join(".msync").exists());
}

#[test]
fn writes_urls_to_config() {
    let temp = TempDir::new().unwrap();

    msync()
        .args([
            "init",
            "--api-url",
            "https://api.example.com",
            "--push-url",
            "wss://push.example.com/events",
        ])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Push: wss://push.example.com/events"));

    let config = std::fs::read_to_string(temp.path().join(".msync/config.toml")).unwrap();
    assert!(config.contains("api_url = \"https://api.example.com\""));
    assert!(config.contains("wss://push.example.com/events"));
}

#[parameterized(
    no_scheme = { "--api-url", "api.example.com" },
    ftp = { "--api-url", "ftp://api.example.com" },
    http_push = { "--push-url", "http://push.example.com" },
)]
fn rejects_invalid_urls(flag: &str, url: &str) {
    let temp = TempDir::new().unwrap();

    msync()
        .args(["init", flag, url])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("config error"));

    assert!(!temp.path().join(".msync").exists());
}

#[test]
fn data_dir_env_moves_database() {
    let temp = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();

    msync()
        .arg("init")
        .env("MSYNC_DATA_DIR", data.path())
        .current_dir(temp.path())
        .assert()
        .success();

    assert!(data.path().join("sync.db").exists());
    assert!(!temp.path().join(".msync/sync.db").exists());
}
