// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use chrono::{DateTime, Utc};
use ms_core::{OperationQueue, QueueStatus, QueuedOperation};
use serde::Serialize;

use super::{open_db, parse_queue_id, system_clock};
use crate::cli::{OutputFormat, QueueCommand};
use crate::error::Result;

/// JSON representation of a queued action for list output.
#[derive(Serialize)]
struct QueueItemJson<'a> {
    id: String,
    status: QueueStatus,
    retry_count: u32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    enqueued_at: DateTime<Utc>,
    operation: &'a ms_core::Action,
}

impl<'a> QueueItemJson<'a> {
    fn from_item(item: &'a QueuedOperation) -> Self {
        QueueItemJson {
            id: item.id.to_string(),
            status: item.status,
            retry_count: item.retry_count,
            kind: item.operation.kind().as_str(),
            target: format_target(item),
            enqueued_at: item.enqueued_at,
            operation: &item.operation,
        }
    }
}

fn format_target(item: &QueuedOperation) -> Option<String> {
    item.operation
        .target()
        .map(|(collection, id)| format!("{}/{}", collection.as_str(), id))
}

pub fn run(command: QueueCommand) -> Result<()> {
    let (db, _ctx) = open_db()?;
    let queue = OperationQueue::new(db, system_clock())?;
    run_impl(&queue, command, &mut std::io::stdout())
}

pub(crate) fn run_impl(
    queue: &OperationQueue,
    command: QueueCommand,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        QueueCommand::List { failed, output } => list(queue, failed, output, out),
        QueueCommand::Requeue { id } => {
            let id = parse_queue_id(&id)?;
            queue.requeue(id)?;
            writeln!(out, "Requeued {}", id)?;
            Ok(())
        }
        QueueCommand::Discard { id } => {
            let id = parse_queue_id(&id)?;
            queue.discard(id)?;
            writeln!(out, "Discarded {}", id)?;
            Ok(())
        }
        QueueCommand::ClearFailed => {
            let count = queue.clear_failed()?;
            writeln!(out, "Cleared {} failed action(s)", count)?;
            Ok(())
        }
    }
}

fn list(
    queue: &OperationQueue,
    failed: bool,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let items = if failed {
        queue.list_failed()?
    } else {
        queue.list_all()?
    };

    match output {
        OutputFormat::Json => {
            let json: Vec<_> = items.iter().map(QueueItemJson::from_item).collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        OutputFormat::Text => {
            if items.is_empty() {
                writeln!(out, "Queue is empty")?;
                return Ok(());
            }
            for item in &items {
                let target = format_target(item).unwrap_or_else(|| "-".to_string());
                writeln!(
                    out,
                    "{}  {:<10} retries={}  {}  {}  {}",
                    item.id,
                    item.status.as_str(),
                    item.retry_count,
                    item.operation.kind(),
                    target,
                    item.enqueued_at.format("%Y-%m-%d %H:%M:%S"),
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
