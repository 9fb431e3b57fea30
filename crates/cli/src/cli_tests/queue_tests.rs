// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! CLI argument parsing tests for the `queue` and `cache` commands.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use yare::parameterized;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[parameterized(
    all = { &["msync", "queue", "list"], false, OutputFormat::Text },
    failed = { &["msync", "queue", "list", "--failed"], true, OutputFormat::Text },
    json = { &["msync", "queue", "list", "-o", "json"], false, OutputFormat::Json },
)]
fn test_queue_list(args: &[&str], expected_failed: bool, expected_output: OutputFormat) {
    match parse(args).unwrap().command {
        Command::Queue(QueueCommand::List { failed, output }) => {
            assert_eq!(failed, expected_failed);
            assert_eq!(output, expected_output);
        }
        _ => panic!("expected queue list"),
    }
}

#[test]
fn test_queue_requeue_and_discard() {
    match parse(&["msync", "queue", "requeue", "1000-0"]).unwrap().command {
        Command::Queue(QueueCommand::Requeue { id }) => assert_eq!(id, "1000-0"),
        _ => panic!("expected queue requeue"),
    }
    match parse(&["msync", "queue", "discard", "1000-1"]).unwrap().command {
        Command::Queue(QueueCommand::Discard { id }) => assert_eq!(id, "1000-1"),
        _ => panic!("expected queue discard"),
    }
}

#[parameterized(
    requeue = { &["msync", "queue", "requeue"] },
    discard = { &["msync", "queue", "discard"] },
    cache_get = { &["msync", "cache", "get"] },
)]
fn test_missing_argument_is_error(args: &[&str]) {
    assert!(parse(args).is_err());
}

#[test]
fn test_queue_clear_failed() {
    assert!(matches!(
        parse(&["msync", "queue", "clear-failed"]).unwrap().command,
        Command::Queue(QueueCommand::ClearFailed)
    ));
}

#[test]
fn test_cache_commands() {
    assert!(matches!(
        parse(&["msync", "cache", "sweep"]).unwrap().command,
        Command::Cache(CacheCommand::Sweep)
    ));
    match parse(&["msync", "cache", "get", "jobs/fetchJob/job-1"])
        .unwrap()
        .command
    {
        Command::Cache(CacheCommand::Get { key }) => assert_eq!(key, "jobs/fetchJob/job-1"),
        _ => panic!("expected cache get"),
    }
}
