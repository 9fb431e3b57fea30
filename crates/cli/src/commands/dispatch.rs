// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `msync dispatch`: sends one action the way the client would.
//!
//! The server is checked once up front. While it is unreachable, queueable
//! writes land in the offline queue for the next `msync run` to drain and
//! reads are answered from the response cache.

use std::io::Write;
use std::sync::Arc;

use ms_core::{Action, OperationQueue, Store, TtlCache};
use serde::Serialize;
use serde_json::Value;

use super::{open_db, system_clock};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sync::{
    ConnectivityMonitor, DispatchOutcome, Dispatcher, HealthCheck, HttpHealthCheck,
    HttpTransport, Interceptor, Transport, TransportError,
};

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
enum OutcomeJson<'a> {
    Completed {
        kind: &'static str,
        result: &'a Value,
    },
    Deferred {
        kind: &'static str,
        queue_id: String,
    },
    Cached {
        kind: &'static str,
        result: &'a Value,
    },
}

pub fn run(action: &str, offline: bool, output: OutputFormat) -> Result<()> {
    let action = parse_action(action)?;
    let (db, ctx) = open_db()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Runtime(e.to_string()))?;

    runtime.block_on(async {
        let online = !offline && reachable(&ctx.config).await?;
        let transport = Arc::new(HttpTransport::new(
            &ctx.config.api_url,
            ctx.config.request_timeout(),
        )?);
        // No engine here: a running `msync run` owns replay and recovery.
        let interceptor = Interceptor::new(
            Dispatcher::new(transport, Store::shared()),
            OperationQueue::new(db.clone(), system_clock())?,
            TtlCache::new(db, system_clock(), ctx.config.default_ttl()),
            ConnectivityMonitor::new(online),
        );
        run_impl(&interceptor, action, output, &mut std::io::stdout()).await
    })
}

pub(crate) async fn run_impl<T: Transport>(
    interceptor: &Interceptor<T>,
    action: Action,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let kind = action.kind().as_str();
    let outcome = interceptor.fetch(action).await?;

    match output {
        OutputFormat::Json => {
            let json = match &outcome {
                DispatchOutcome::Completed(result) => OutcomeJson::Completed { kind, result },
                DispatchOutcome::Deferred { queue_id } => OutcomeJson::Deferred {
                    kind,
                    queue_id: queue_id.to_string(),
                },
                DispatchOutcome::Cached(result) => OutcomeJson::Cached { kind, result },
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        OutputFormat::Text => match &outcome {
            DispatchOutcome::Completed(result) => {
                writeln!(out, "Sent {kind}")?;
                write_result(out, result)?;
            }
            DispatchOutcome::Deferred { queue_id } => {
                writeln!(out, "Queued {kind} as {queue_id} (server unreachable)")?;
            }
            DispatchOutcome::Cached(result) => {
                writeln!(out, "Served {kind} from cache")?;
                write_result(out, result)?;
            }
        },
    }
    Ok(())
}

/// Parses an action from its `{"kind": ..., "payload": ...}` form.
pub(crate) fn parse_action(json: &str) -> Result<Action> {
    serde_json::from_str(json).map_err(|e| Error::InvalidAction(e.to_string()))
}

async fn reachable(config: &Config) -> Result<bool> {
    let check = HttpHealthCheck::new(&config.health_url(), config.probe_timeout())
        .map_err(|e| TransportError::Unreachable(e.to_string()))?;
    Ok(check.check().await)
}

fn write_result(out: &mut impl Write, result: &Value) -> Result<()> {
    if !result.is_null() {
        writeln!(out, "{}", serde_json::to_string_pretty(result)?)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
