// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! CLI argument parsing tests for the `dispatch` command.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;

#[test]
fn test_dispatch_takes_action_json() {
    let json = r#"{"kind":"jobs/deleteJob","payload":{"id":"job-1"}}"#;
    match Cli::try_parse_from(["msync", "dispatch", "--offline", json])
        .unwrap()
        .command
    {
        Command::Dispatch {
            action,
            offline,
            output,
        } => {
            assert_eq!(action, json);
            assert!(offline);
            assert_eq!(output, OutputFormat::Text);
        }
        _ => panic!("expected dispatch"),
    }
}

#[test]
fn test_dispatch_defaults_online() {
    match Cli::try_parse_from(["msync", "dispatch", "-o", "json", "{}"])
        .unwrap()
        .command
    {
        Command::Dispatch {
            offline, output, ..
        } => {
            assert!(!offline);
            assert_eq!(output, OutputFormat::Json);
        }
        _ => panic!("expected dispatch"),
    }
}

#[test]
fn test_dispatch_requires_action() {
    assert!(Cli::try_parse_from(["msync", "dispatch"]).is_err());
}
