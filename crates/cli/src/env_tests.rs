// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::path::PathBuf;

#[test]
fn test_vars_constants() {
    assert_eq!(vars::MSYNC_DATA_DIR, "MSYNC_DATA_DIR");
    assert_eq!(vars::MSYNC_API_URL, "MSYNC_API_URL");
    assert_eq!(vars::MSYNC_PUSH_URL, "MSYNC_PUSH_URL");
}

#[test]
fn test_data_dir() {
    std::env::set_var("MSYNC_DATA_DIR", "/tmp/msync-data");
    assert_eq!(data_dir(), Some(PathBuf::from("/tmp/msync-data")));

    std::env::set_var("MSYNC_DATA_DIR", "");
    assert_eq!(data_dir(), None);

    std::env::remove_var("MSYNC_DATA_DIR");
    assert_eq!(data_dir(), None);
}

#[test]
fn test_api_url() {
    std::env::set_var("MSYNC_API_URL", "http://api.test");
    assert_eq!(api_url().as_deref(), Some("http://api.test"));
    std::env::remove_var("MSYNC_API_URL");
    assert_eq!(api_url(), None);
}

#[test]
fn test_push_url() {
    std::env::set_var("MSYNC_PUSH_URL", "ws://push.test");
    assert_eq!(push_url().as_deref(), Some("ws://push.test"));
    std::env::remove_var("MSYNC_PUSH_URL");
    assert_eq!(push_url(), None);
}
