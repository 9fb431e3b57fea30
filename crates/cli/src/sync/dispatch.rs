// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The single dispatch path used for live actions and queue replays alike.

use std::sync::Arc;

use ms_core::{lock_store, Action, SharedStore};
use serde_json::Value;
use tracing::debug;

use super::transport::{Transport, TransportResult};

/// Executes actions on the transport and folds successful results into the
/// reconciler.
pub struct Dispatcher<T: Transport> {
    transport: Arc<T>,
    store: SharedStore,
}

impl<T: Transport> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Dispatcher {
            transport: Arc::clone(&self.transport),
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: Arc<T>, store: SharedStore) -> Self {
        Dispatcher { transport, store }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Sends `action` and, on success, applies the server's response.
    ///
    /// A failure leaves the store untouched.
    pub async fn submit(&self, action: &Action) -> TransportResult<Value> {
        let result = self.transport.execute(action).await?;
        let touched = lock_store(&self.store).apply_result(action, &result);
        debug!(kind = %action.kind(), touched, "applied server result");
        Ok(result)
    }
}
