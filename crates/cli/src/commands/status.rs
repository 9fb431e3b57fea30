// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use ms_core::{OperationQueue, StatusCounts, TtlCache};
use serde::Serialize;

use super::{open_db, system_clock};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    api_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    push_url: Option<&'a str>,
    queue: StatusCounts,
    cache_entries: usize,
}

pub fn run(output: OutputFormat) -> Result<()> {
    let (db, ctx) = open_db()?;
    let queue = OperationQueue::new(db.clone(), system_clock())?;
    let cache = TtlCache::new(db, system_clock(), ctx.config.default_ttl());
    run_impl(&queue, &cache, &ctx.config, output, &mut std::io::stdout())
}

pub(crate) fn run_impl(
    queue: &OperationQueue,
    cache: &TtlCache,
    config: &Config,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let report = StatusReport {
        api_url: &config.api_url,
        push_url: config.push.url.as_deref(),
        queue: queue.count_by_status()?,
        cache_entries: cache.len()?,
    };

    match output {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        OutputFormat::Text => {
            writeln!(out, "api:        {}", report.api_url)?;
            writeln!(out, "push:       {}", report.push_url.unwrap_or("(disabled)"))?;
            writeln!(out, "pending:    {}", report.queue.pending)?;
            writeln!(out, "processing: {}", report.queue.processing)?;
            writeln!(out, "failed:     {}", report.queue.failed)?;
            writeln!(out, "cached:     {}", report.cache_entries)?;
            if report.queue.failed > 0 {
                writeln!(
                    out,
                    "\nhint: inspect with 'msync queue list --failed', then requeue or discard"
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
