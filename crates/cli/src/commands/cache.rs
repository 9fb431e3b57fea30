// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use ms_core::TtlCache;

use super::{open_db, system_clock};
use crate::cli::CacheCommand;
use crate::error::{Error, Result};

pub fn run(command: CacheCommand) -> Result<()> {
    let (db, ctx) = open_db()?;
    let cache = TtlCache::new(db, system_clock(), ctx.config.default_ttl());
    run_impl(&cache, command, &mut std::io::stdout())
}

pub(crate) fn run_impl(cache: &TtlCache, command: CacheCommand, out: &mut impl Write) -> Result<()> {
    match command {
        CacheCommand::Sweep => {
            let evicted = cache.sweep()?;
            tracing::debug!(evicted, "swept response cache");
            writeln!(out, "Evicted {} expired entr{}", evicted, plural(evicted))?;
        }
        CacheCommand::Get { key } => {
            let data = cache.get(&key)?.ok_or(Error::CacheMiss(key))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&data)?)?;
        }
    }
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "y"
    } else {
        "ies"
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
