// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Entity records held by the reconciler.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::action::Changes;
use crate::error::{Error, Result};

/// Whether a record reflects server-confirmed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Matches the last state the server confirmed.
    Synced,
    /// Holds local changes waiting for confirmation.
    Pending,
    /// Local changes the server never accepted.
    Failed,
}

impl SyncStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
            SyncStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "synced" => Ok(SyncStatus::Synced),
            "pending" => Ok(SyncStatus::Pending),
            "failed" => Ok(SyncStatus::Failed),
            _ => Err(Error::InvalidSyncStatus(s.to_string())),
        }
    }
}

/// A record in one of the reconciler's tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier (provisional until the server confirms it).
    pub id: String,
    /// Domain fields, including `id`.
    pub fields: Changes,
    pub sync_status: SyncStatus,
    /// True while the record holds unconfirmed local changes.
    pub is_optimistic: bool,
}

impl Entity {
    /// Creates an empty synced record.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut fields = Changes::new();
        fields.insert("id".to_string(), Value::String(id.clone()));
        Entity {
            id,
            fields,
            sync_status: SyncStatus::Synced,
            is_optimistic: false,
        }
    }

    /// Builds a synced record from a server snapshot.
    ///
    /// The snapshot must be a JSON object with a string `id`.
    pub fn from_snapshot(snapshot: &Value) -> Result<Self> {
        let fields = snapshot
            .as_object()
            .ok_or_else(|| Error::InvalidSnapshot("expected a JSON object".to_string()))?;
        let id = snapshot_id(snapshot)
            .ok_or_else(|| Error::InvalidSnapshot("missing string field 'id'".to_string()))?;
        Ok(Entity {
            id: id.to_string(),
            fields: fields.clone(),
            sync_status: SyncStatus::Synced,
            is_optimistic: false,
        })
    }

    /// Shallow-merges `changes` over the current fields.
    pub fn merge(&mut self, changes: &Changes) {
        for (key, value) in changes {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Returns a field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Renders the record as a single JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Returns the `id` of a snapshot when it has a string one.
pub fn snapshot_id(snapshot: &Value) -> Option<&str> {
    snapshot.get("id").and_then(Value::as_str)
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
