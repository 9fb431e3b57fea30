// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for executing actions against the server.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP requests for production
//! - Mock transports for unit testing

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use ms_core::Action;
use reqwest::{Client, Method};
use serde_json::{json, Value};

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The server could not be reached.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The request did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TransportError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Informational only: the replayer counts every failure toward the
    /// retry ceiling.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Unreachable(_) | TransportError::Timeout(_) => true,
            TransportError::Rejected { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            TransportError::Serialization(_) => false,
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport trait for request/response communication with the server.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync {
    /// Executes an action and returns the server's JSON response.
    ///
    /// An empty response body is returned as `Value::Null`.
    fn execute(
        &self,
        action: &Action,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Value>> + Send + '_>>;
}

/// A REST request derived from an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl Route {
    fn new(method: Method, path: String) -> Self {
        Route {
            method,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Maps an action onto its REST endpoint.
///
/// Creates carry the provisional id as `client_id` so the server can
/// deduplicate a replayed create.
pub fn route(action: &Action) -> TransportResult<Route> {
    let route = match action {
        Action::CreateJob { id, job } => {
            let mut body = serde_json::to_value(job)
                .map_err(|e| TransportError::Serialization(e.to_string()))?;
            if let Value::Object(map) = &mut body {
                map.insert("client_id".to_string(), Value::String(id.clone()));
            }
            Route::new(Method::POST, "/jobs".to_string()).with_body(body)
        }
        Action::UpdateJob { id, changes } => Route::new(Method::PATCH, format!("/jobs/{id}"))
            .with_body(Value::Object(changes.clone())),
        Action::DeleteJob { id } => Route::new(Method::DELETE, format!("/jobs/{id}")),
        Action::FetchJobs { query } => {
            let mut route = Route::new(Method::GET, "/jobs".to_string());
            if let Some(search) = &query.search {
                route.query.push(("search", search.clone()));
            }
            if let Some(page) = query.page {
                route.query.push(("page", page.to_string()));
            }
            route
        }
        Action::FetchJob { id } => Route::new(Method::GET, format!("/jobs/{id}")),
        Action::SendMessage {
            id,
            conversation_id,
            body,
        } => Route::new(
            Method::POST,
            format!("/conversations/{conversation_id}/messages"),
        )
        .with_body(json!({"client_id": id, "body": body})),
        Action::FetchMessages { conversation_id } => Route::new(
            Method::GET,
            format!("/conversations/{conversation_id}/messages"),
        ),
        Action::UpdateProfile { id, changes } => {
            Route::new(Method::PATCH, format!("/profiles/{id}"))
                .with_body(Value::Object(changes.clone()))
        }
        Action::FetchProfile { id } => Route::new(Method::GET, format!("/profiles/{id}")),
        Action::Login { email, password } => Route::new(Method::POST, "/auth/login".to_string())
            .with_body(json!({"email": email, "password": password})),
        Action::Logout => Route::new(Method::POST, "/auth/logout".to_string()),
        Action::Register {
            email,
            password,
            display_name,
        } => Route::new(Method::POST, "/auth/register".to_string()).with_body(
            json!({"email": email, "password": password, "display_name": display_name}),
        ),
    };
    Ok(route)
}

/// HTTP transport implementation using reqwest.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a new HTTP transport for the given API root.
    pub fn new(base_url: &str, timeout: Duration) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                TransportError::Unreachable(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Full URL for a route path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn execute(
        &self,
        action: &Action,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Value>> + Send + '_>> {
        let route = route(action);
        Box::pin(async move {
            let route = route?;
            let mut request = self
                .client
                .request(route.method.clone(), self.url(&route.path))
                .query(&route.query);
            if let Some(body) = &route.body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout)
                } else {
                    TransportError::Unreachable(e.to_string())
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(TransportError::Rejected {
                    status: status.as_u16(),
                    message,
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| TransportError::Unreachable(e.to_string()))?;
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Serialization(e.to_string()))
        })
    }
}
