// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity state and edge notifications.
//!
//! [`ConnectivityMonitor`] holds the current online/offline state and wakes
//! subscribers only when it actually changes. [`spawn_probe`] runs the
//! background health check that feeds it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Current connectivity, shared by everything that needs to know.
///
/// Cheap to clone; clones observe and update the same state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    state: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        ConnectivityMonitor {
            state: Arc::new(tx),
        }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Records the latest observation. Returns true if this was an edge.
    ///
    /// Repeating the current state notifies nobody.
    pub fn set_online(&self, online: bool) -> bool {
        self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        })
    }

    /// Subscribes to edges from now on. Dropping the handle unsubscribes.
    pub fn subscribe(&self) -> ConnectivitySubscription {
        let mut rx = self.state.subscribe();
        let last = *rx.borrow_and_update();
        ConnectivitySubscription { rx, last }
    }
}

/// Receives connectivity edges.
pub struct ConnectivitySubscription {
    rx: watch::Receiver<bool>,
    last: bool,
}

impl ConnectivitySubscription {
    /// Waits for the next edge and returns the new state.
    ///
    /// Rapid flips that end where they started are not reported. Returns
    /// `None` once the monitor is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        loop {
            self.rx.changed().await.ok()?;
            let now = *self.rx.borrow_and_update();
            if now != self.last {
                self.last = now;
                return Some(now);
            }
        }
    }
}

/// A single reachability check.
pub trait HealthCheck: Send + Sync {
    /// Returns true if the server is reachable.
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Health check that issues a GET and treats any 2xx as reachable.
pub struct HttpHealthCheck {
    client: reqwest::Client,
    url: String,
}

impl HttpHealthCheck {
    pub fn new(url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpHealthCheck {
            client,
            url: url.to_string(),
        })
    }
}

impl HealthCheck for HttpHealthCheck {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            match self.client.get(&self.url).send().await {
                Ok(response) => response.status().is_success(),
                Err(e) => {
                    debug!(url = %self.url, error = %e, "health check failed");
                    false
                }
            }
        })
    }
}

/// Polls `check` every `interval` and feeds the results into `monitor`
/// until cancelled.
pub fn spawn_probe<H: HealthCheck + 'static>(
    check: H,
    monitor: ConnectivityMonitor,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let online = tokio::select! {
                _ = cancel.cancelled() => return,
                online = check.check() => online,
            };
            if monitor.set_online(online) {
                info!(online, "connectivity changed");
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    })
}
