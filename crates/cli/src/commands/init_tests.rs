// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::run_impl;
use crate::config::{db_path, Config, CONFIG_DIR_NAME};
use crate::error::Error;
use tempfile::TempDir;

fn init(
    dir: &TempDir,
    api_url: Option<&str>,
    push_url: Option<&str>,
) -> crate::error::Result<String> {
    let mut out = Vec::new();
    run_impl(
        api_url,
        push_url.map(String::from),
        dir.path(),
        None,
        &mut out,
    )?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn test_init_creates_config_and_database() {
    let dir = TempDir::new().unwrap();
    let text = init(&dir, None, None).unwrap();

    let config_dir = dir.path().join(CONFIG_DIR_NAME);
    assert!(config_dir.join("config.toml").exists());
    assert!(config_dir.join(".gitignore").exists());
    assert!(db_path(&config_dir).exists());
    assert!(text.contains("Initialized sync state"));
    assert!(text.contains("Push: disabled"));
}

#[test]
fn test_init_records_urls() {
    let dir = TempDir::new().unwrap();
    init(
        &dir,
        Some("https://api.example.com/v1/"),
        Some("wss://push.example.com"),
    )
    .unwrap();

    let config = Config::load(&dir.path().join(CONFIG_DIR_NAME)).unwrap();
    assert_eq!(config.api_url, "https://api.example.com/v1");
    assert_eq!(config.push.url.as_deref(), Some("wss://push.example.com"));
}

#[test]
fn test_init_twice_fails() {
    let dir = TempDir::new().unwrap();
    init(&dir, None, None).unwrap();
    let err = init(&dir, None, None).unwrap_err();
    assert!(matches!(err, Error::AlreadyInitialized(_)));
}

#[test]
fn test_init_rejects_bad_urls() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        init(&dir, Some("ftp://example.com"), None).unwrap_err(),
        Error::Config(_)
    ));
    assert!(matches!(
        init(&dir, None, Some("http://push.example.com")).unwrap_err(),
        Error::Config(_)
    ));
    assert!(!dir.path().join(CONFIG_DIR_NAME).exists());
}

#[test]
fn test_init_honors_data_dir_override() {
    let dir = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let data_dir = data.path().join("state");

    let mut out = Vec::new();
    run_impl(None, None, dir.path(), Some(data_dir.clone()), &mut out).unwrap();

    assert!(db_path(&data_dir).exists());
    assert!(!db_path(&dir.path().join(CONFIG_DIR_NAME)).exists());
}
