// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// Custom help template that groups commands into sections
const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Sync Engine:
  run         Run the sync engine until interrupted
  dispatch    Send one action, queueing it if offline
  status      Show queue and cache status

Offline Queue:
  queue       List, requeue or discard queued actions
  cache       Inspect or sweep the response cache

Setup:
  init        Initialize sync state in a directory";

const QUICKSTART_HELP: &str = "\
Get started:
  msync init --api-url https://market.example.com/api
  msync run                 Run the engine (Ctrl-C to stop)
  msync status              Show pending and failed actions
  msync queue list --failed List actions that gave up";

#[derive(Parser)]
#[command(name = "msync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first sync engine for the marketplace client")]
#[command(
    long_about = "Offline-first sync engine for the marketplace client.\n\n\
    Queues writes made while offline, replays them in order on reconnect, \
    caches reads, and merges server pushes."
)]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Run as if msync was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize sync state
    #[command(after_help = "Examples:\n  \
        msync init                                      Use the default local API\n  \
        msync init --api-url https://market.test/api    Point at a server\n  \
        msync init --push-url wss://market.test/push    Enable the push channel")]
    Init {
        /// Root URL of the REST API
        #[arg(long)]
        api_url: Option<String>,

        /// WebSocket URL of the push channel
        #[arg(long)]
        push_url: Option<String>,

        /// Path to initialize (defaults to current directory)
        #[arg(long)]
        path: Option<String>,
    },

    /// Show queue counts by status and cache size
    Status {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Manage the offline queue
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Manage the response cache
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Send one action through the engine
    ///
    /// Reads go through the response cache. Writes made while the server is
    /// unreachable (or with --offline) are queued for the next drain.
    #[command(
        arg_required_else_help = true,
        after_help = "Examples:\n  \
        msync dispatch '{\"kind\":\"jobs/fetchJob\",\"payload\":{\"id\":\"job-1\"}}'\n  \
        msync dispatch --offline \\\n    \
        '{\"kind\":\"jobs/updateJob\",\"payload\":{\"id\":\"job-1\",\"changes\":{\"title\":\"Paint\"}}}'"
    )]
    Dispatch {
        /// Action as JSON: {"kind": ..., "payload": {...}}
        action: String,

        /// Skip the reachability check and treat the server as down
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Run the sync engine until Ctrl-C
    Run {
        /// Start offline and skip the health probe
        #[arg(long)]
        offline: bool,
    },
}

/// Offline queue commands.
#[derive(Subcommand)]
pub enum QueueCommand {
    /// List queued actions in replay order
    List {
        /// Only show actions that exceeded the retry ceiling
        #[arg(long)]
        failed: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Give a failed action a fresh set of attempts
    #[command(arg_required_else_help = true)]
    Requeue {
        /// Queue id (see 'msync queue list')
        id: String,
    },

    /// Drop a queued action without sending it
    #[command(arg_required_else_help = true)]
    Discard {
        /// Queue id (see 'msync queue list')
        id: String,
    },

    /// Drop every failed action
    ClearFailed,
}

/// Response cache commands.
#[derive(Subcommand)]
pub enum CacheCommand {
    /// Evict expired entries
    Sweep,

    /// Print a cached response if it is still fresh
    #[command(
        arg_required_else_help = true,
        after_help = "Examples:\n  \
        msync cache get 'jobs/fetchJobs?search=&page=1'\n  \
        msync cache get profile/fetchProfile/me"
    )]
    Get {
        /// Cache key
        key: String,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
