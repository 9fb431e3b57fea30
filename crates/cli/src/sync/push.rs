// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time push channel from the server.
//!
//! Push events bypass the operation queue and are merged straight into the
//! reconciler. The listener task owns the channel, reconnects with
//! exponential backoff when it drops, and forwards decoded events to a
//! [`PushSubscription`]. Dropping the subscription stops the task.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use ms_core::PushEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Error type for push channel operations.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// A frame could not be decoded as a push event.
    #[error("invalid push event: {0}")]
    InvalidEvent(String),

    /// Gave up reconnecting.
    #[error("gave up after {attempts} connection attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Result type for push channel operations.
pub type PushResult<T> = Result<T, PushError>;

/// A server-to-client event stream.
pub trait PushChannel: Send {
    /// Connect to the push endpoint.
    fn connect(&mut self, url: &str) -> Pin<Box<dyn Future<Output = PushResult<()>> + Send + '_>>;

    /// Disconnect from the server.
    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = PushResult<()>> + Send + '_>>;

    /// Receive the next event.
    ///
    /// Returns `None` if the connection is closed.
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = PushResult<Option<PushEvent>>> + Send + '_>>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket push channel implementation using tokio-tungstenite.
#[derive(Default)]
pub struct WebSocketPushChannel {
    ws: Option<WsStream>,
}

impl WebSocketPushChannel {
    pub fn new() -> Self {
        WebSocketPushChannel { ws: None }
    }
}

impl PushChannel for WebSocketPushChannel {
    fn connect(&mut self, url: &str) -> Pin<Box<dyn Future<Output = PushResult<()>> + Send + '_>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
                .await
                .map_err(|e| PushError::ConnectionFailed(e.to_string()))?;
            self.ws = Some(ws_stream);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = PushResult<()>> + Send + '_>> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                // Best effort, the socket may already be gone
                let _ = ws.close(None).await;
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> Pin<Box<dyn Future<Output = PushResult<Option<PushEvent>>> + Send + '_>> {
        Box::pin(async move {
            use futures_util::StreamExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(PushError::ConnectionClosed)?;

            loop {
                match ws.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let event: PushEvent = serde_json::from_str(&text)
                            .map_err(|e| PushError::InvalidEvent(e.to_string()))?;
                        return Ok(Some(event));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        self.ws = None;
                        return Ok(None);
                    }
                    // Ping/pong is answered by tungstenite; binary frames are not events
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        self.ws = None;
                        return Err(PushError::ReceiveFailed(e.to_string()));
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}

/// Reconnection settings for the push listener.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// URL to connect to.
    pub url: String,
    /// Maximum consecutive failed attempts (0 = unlimited).
    pub max_retries: u32,
    /// Maximum delay between reconnection attempts (seconds).
    pub max_delay_secs: u64,
    /// Initial delay for exponential backoff (milliseconds).
    pub initial_delay_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/push".to_string(),
            max_retries: 10,
            max_delay_secs: 30,
            initial_delay_ms: 100,
        }
    }
}

/// Connects with exponential backoff.
///
/// Returns `Ok(false)` if cancelled before a connection was made.
async fn connect_with_retry<P: PushChannel>(
    channel: &mut P,
    config: &ConnectionConfig,
    cancel: &CancellationToken,
) -> PushResult<bool> {
    let mut attempt = 0u32;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        if cancel.is_cancelled() {
            return Ok(false);
        }
        attempt = attempt.saturating_add(1);

        let result = tokio::select! {
            _ = cancel.cancelled() => return Ok(false),
            result = channel.connect(&config.url) => result,
        };

        match result {
            Ok(()) => {
                info!(url = %config.url, attempt, "push channel connected");
                return Ok(true);
            }
            Err(e) => {
                if config.max_retries > 0 && attempt >= config.max_retries {
                    return Err(PushError::RetriesExhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                debug!(attempt, delay_ms, error = %e, "push connect failed, backing off");

                tokio::select! {
                    _ = cancel.cancelled() => return Ok(false),
                    _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                }
                delay_ms = std::cmp::min(
                    delay_ms.saturating_mul(2),
                    config.max_delay_secs.saturating_mul(1000),
                );
            }
        }
    }
}

/// Runs the push listener until cancelled, the receiver is dropped, or
/// reconnection gives up.
pub async fn listen<P: PushChannel>(
    mut channel: P,
    config: ConnectionConfig,
    events: mpsc::Sender<PushEvent>,
    cancel: CancellationToken,
) -> PushResult<()> {
    loop {
        if !connect_with_retry(&mut channel, &config, &cancel).await? {
            return Ok(());
        }

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = channel.disconnect().await;
                    return Ok(());
                }
                received = channel.recv() => received,
            };

            match received {
                Ok(Some(event)) => {
                    if events.send(event).await.is_err() {
                        let _ = channel.disconnect().await;
                        return Ok(());
                    }
                }
                Ok(None) => {
                    warn!("push channel closed by server, reconnecting");
                    break;
                }
                Err(PushError::InvalidEvent(e)) => {
                    warn!(error = %e, "skipping malformed push event");
                }
                Err(e) => {
                    warn!(error = %e, "push channel failed, reconnecting");
                    let _ = channel.disconnect().await;
                    break;
                }
            }
        }
    }
}

/// Handle to a running push listener.
///
/// Dropping the handle cancels the listener task.
pub struct PushSubscription {
    events: mpsc::Receiver<PushEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<PushResult<()>>>,
}

impl PushSubscription {
    /// Spawns a listener over `channel`.
    pub fn spawn<P: PushChannel + 'static>(channel: P, config: ConnectionConfig) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(listen(channel, config, tx, cancel.clone()));
        PushSubscription {
            events: rx,
            cancel,
            task: Some(task),
        }
    }

    /// Next pushed event, or `None` once the listener has stopped.
    pub async fn recv(&mut self) -> Option<PushEvent> {
        self.events.recv().await
    }

    /// Stops the listener and waits for it to finish.
    pub async fn close(mut self) -> PushResult<()> {
        self.cancel.cancel();
        match self.task.take() {
            Some(task) => task
                .await
                .unwrap_or_else(|e| Err(PushError::ReceiveFailed(e.to_string()))),
            None => Ok(()),
        }
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
