// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! CLI argument parsing tests for the `run` command and top-level help.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use clap::CommandFactory;

#[test]
fn test_run_defaults_online() {
    match Cli::try_parse_from(["msync", "run"]).unwrap().command {
        Command::Run { offline } => assert!(!offline),
        _ => panic!("expected Run command"),
    }
}

#[test]
fn test_run_offline_flag() {
    match Cli::try_parse_from(["msync", "run", "--offline"]).unwrap().command {
        Command::Run { offline } => assert!(offline),
        _ => panic!("expected Run command"),
    }
}

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_help_lists_command_groups() {
    let help = Cli::command().render_help().to_string();
    assert!(help.contains("Sync Engine:"));
    assert!(help.contains("Offline Queue:"));
    assert!(help.contains("msync init --api-url"));
}

#[test]
fn test_unknown_command_is_error() {
    assert!(Cli::try_parse_from(["msync", "frobnicate"]).is_err());
}
