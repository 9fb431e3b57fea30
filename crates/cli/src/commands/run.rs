// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `msync run`: hosts the sync engine in the foreground until Ctrl-C.
//!
//! Logs go to `msync.log` in the data directory, and a lock file keeps a
//! second engine from draining the same queue.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ms_core::{Database, SharedDb};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{load_context, system_clock};
use crate::config::{db_path, lock_path, log_path, Config};
use crate::error::{Error, Result};
use crate::sync::{
    spawn_probe, ConnectivityMonitor, Engine, HttpHealthCheck, HttpTransport, PushSubscription,
    TransportError, WebSocketPushChannel,
};

pub fn run(offline: bool) -> Result<()> {
    let ctx = load_context()?;
    fs::create_dir_all(&ctx.data_dir)?;

    setup_logging(&log_path(&ctx.data_dir));
    info!(data_dir = %ctx.data_dir.display(), offline, "msync starting");

    // Held until the process exits
    let _lock = acquire_lock(&lock_path(&ctx.data_dir))?;

    let db = Database::open(&db_path(&ctx.data_dir))?.into_shared();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Runtime(e.to_string()))?;

    println!("Sync engine running (Ctrl-C to stop)");
    runtime.block_on(async {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("interrupt received, shutting down"),
                Err(e) => warn!(error = %e, "failed to listen for interrupt"),
            }
            on_signal.cancel();
        });
        serve(db, &ctx.config, offline, cancel).await
    })?;
    println!("Sync engine stopped");
    Ok(())
}

/// Wires the engine to HTTP, the health probe and the push channel, then
/// runs it until `cancel` fires.
///
/// With `offline`, neither the probe nor the push listener is started and the
/// engine stays offline, queueing eligible actions.
pub(crate) async fn serve(
    db: SharedDb,
    config: &Config,
    offline: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let transport = Arc::new(HttpTransport::new(
        &config.api_url,
        config.request_timeout(),
    )?);
    // Offline until the first probe answers
    let connectivity = ConnectivityMonitor::new(false);

    let probe = if offline {
        None
    } else {
        let check = HttpHealthCheck::new(&config.health_url(), config.probe_timeout())
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;
        Some(spawn_probe(
            check,
            connectivity.clone(),
            config.probe_interval(),
            cancel.child_token(),
        ))
    };

    let push = match config.connection_config() {
        Some(connection) if !offline => {
            info!(url = %connection.url, "subscribing to push channel");
            Some(PushSubscription::spawn(WebSocketPushChannel::new(), connection))
        }
        _ => None,
    };

    let engine = Engine::open(
        db,
        system_clock(),
        transport,
        connectivity,
        config.engine_config(),
    )?;
    engine.run(push, cancel.clone()).await;

    if let Some(probe) = probe {
        cancel.cancel();
        if let Err(e) = probe.await {
            warn!(error = %e, "health probe task failed");
        }
    }

    let counts = engine.queue().count_by_status()?;
    info!(
        pending = counts.pending,
        failed = counts.failed,
        "left in queue at shutdown"
    );
    Ok(())
}

fn setup_logging(log_path: &Path) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Try to open log file, fall back to stderr
    if let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

pub(crate) fn acquire_lock(lock_path: &Path) -> Result<fs::File> {
    use fs2::FileExt;

    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| Error::AlreadyRunning(lock_path.display().to_string()))?;
    Ok(file)
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
