// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local entity state and the rules for folding changes into it.
//!
//! Three sources write into the [`Store`]:
//! - optimistic changes from actions waiting in the queue
//! - confirmed results returned by the server for a dispatched action
//! - push events the server sends on its own
//!
//! Rules:
//! - Optimistic apply: merge into the record (create if absent), mark it
//!   `pending` and optimistic
//! - Confirmed apply: server fields always win, mark `synced`
//! - Push upsert: insert or replace wholesale, regardless of pending local
//!   changes (last to arrive wins)
//! - Removal: unconditional
//!
//! All methods are synchronous. Callers share a store as [`SharedStore`] and
//! never hold the lock across an await point.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::action::{Action, Changes, Collection};
use crate::entity::{snapshot_id, Entity, SyncStatus};
use crate::error::Result;

/// A store shared between the interceptor, the replayer and the push listener.
pub type SharedStore = Arc<Mutex<Store>>;

/// Locks a shared store, recovering from a poisoned lock.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(|e| e.into_inner())
}

/// An update the server pushes without being asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// Full snapshot of a created or changed record.
    Upsert { collection: Collection, entity: Value },
    /// A record the server deleted.
    Deleted { collection: Collection, id: String },
}

impl PushEvent {
    pub fn collection(&self) -> Collection {
        match self {
            PushEvent::Upsert { collection, .. } | PushEvent::Deleted { collection, .. } => {
                *collection
            }
        }
    }
}

/// One normalized table: records by id plus their insertion order.
#[derive(Debug, Default, Clone)]
pub struct EntityTable {
    entities: HashMap<String, Entity>,
    ids: Vec<String>,
}

impl EntityTable {
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Records in id-list order.
    pub fn all(&self) -> Vec<&Entity> {
        self.ids.iter().filter_map(|id| self.entities.get(id)).collect()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn entry(&mut self, id: &str) -> &mut Entity {
        if !self.entities.contains_key(id) {
            self.ids.push(id.to_string());
        }
        self.entities
            .entry(id.to_string())
            .or_insert_with(|| Entity::new(id))
    }

    fn replace(&mut self, entity: Entity) {
        if !self.entities.contains_key(&entity.id) {
            self.ids.push(entity.id.clone());
        }
        self.entities.insert(entity.id.clone(), entity);
    }

    fn remove(&mut self, id: &str) -> bool {
        self.ids.retain(|existing| existing != id);
        self.entities.remove(id).is_some()
    }

    /// Moves a record to a new id, keeping its position.
    ///
    /// If a record already exists under `new`, the old record is dropped.
    fn rekey(&mut self, old: &str, new: &str) {
        let Some(mut entity) = self.entities.remove(old) else {
            return;
        };
        if self.entities.contains_key(new) {
            self.ids.retain(|existing| existing != old);
            return;
        }

        entity.id = new.to_string();
        entity
            .fields
            .insert("id".to_string(), Value::String(new.to_string()));
        if let Some(slot) = self.ids.iter_mut().find(|existing| *existing == old) {
            *slot = new.to_string();
        } else {
            self.ids.push(new.to_string());
        }
        self.entities.insert(new.to_string(), entity);
    }
}

/// The reconciler's tables, one per collection.
#[derive(Debug, Default, Clone)]
pub struct Store {
    jobs: EntityTable,
    messages: EntityTable,
    profiles: EntityTable,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a new store for sharing.
    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Store::new()))
    }

    pub fn table(&self, collection: Collection) -> &EntityTable {
        match collection {
            Collection::Jobs => &self.jobs,
            Collection::Messages => &self.messages,
            Collection::Profiles => &self.profiles,
        }
    }

    fn table_mut(&mut self, collection: Collection) -> &mut EntityTable {
        match collection {
            Collection::Jobs => &mut self.jobs,
            Collection::Messages => &mut self.messages,
            Collection::Profiles => &mut self.profiles,
        }
    }

    pub fn get(&self, collection: Collection, id: &str) -> Option<&Entity> {
        self.table(collection).get(id)
    }

    pub fn all(&self, collection: Collection) -> Vec<&Entity> {
        self.table(collection).all()
    }

    pub fn ids(&self, collection: Collection) -> &[String] {
        self.table(collection).ids()
    }

    /// Ids of records that still carry unconfirmed local changes.
    pub fn pending_optimistic_ids(&self, collection: Collection) -> Vec<&str> {
        self.table(collection)
            .all()
            .into_iter()
            .filter(|entity| entity.is_optimistic)
            .map(|entity| entity.id.as_str())
            .collect()
    }

    /// Merges a local change ahead of server confirmation.
    pub fn apply_optimistic(&mut self, collection: Collection, id: &str, changes: &Changes) {
        let entity = self.table_mut(collection).entry(id);
        entity.merge(changes);
        entity.is_optimistic = true;
        entity.sync_status = SyncStatus::Pending;
    }

    /// Applies the optimistic change an action stands for, if it has one.
    ///
    /// Returns true when the store changed.
    pub fn apply_action_optimistic(&mut self, action: &Action) -> bool {
        match action.optimistic_change() {
            Some((collection, id, changes)) => {
                self.apply_optimistic(collection, &id, &changes);
                true
            }
            None => false,
        }
    }

    /// Merges a server-confirmed result for the record `id`.
    ///
    /// Server fields overwrite local ones. When the result names a different
    /// id (a server-assigned one replacing a provisional one), the record is
    /// moved to the server id. A result that is not an object only clears
    /// the optimistic flags.
    pub fn apply_confirmed(&mut self, collection: Collection, id: &str, result: &Value) {
        let table = self.table_mut(collection);
        let server_id = snapshot_id(result).unwrap_or(id).to_string();
        if server_id != id {
            table.rekey(id, &server_id);
        }

        let entity = match result.as_object() {
            Some(fields) => {
                let entity = table.entry(&server_id);
                entity.merge(fields);
                entity
            }
            None => match table.entities.get_mut(&server_id) {
                Some(entity) => entity,
                None => return,
            },
        };
        entity.is_optimistic = false;
        entity.sync_status = SyncStatus::Synced;
    }

    /// Inserts or wholesale-replaces a record from a server snapshot.
    ///
    /// Pending optimistic changes on the same record are discarded.
    pub fn upsert(&mut self, collection: Collection, snapshot: &Value) -> Result<()> {
        let entity = Entity::from_snapshot(snapshot)?;
        self.table_mut(collection).replace(entity);
        Ok(())
    }

    /// Removes a record. Returns true if it existed.
    pub fn remove(&mut self, collection: Collection, id: &str) -> bool {
        self.table_mut(collection).remove(id)
    }

    /// Flags a record whose queued change will never be confirmed.
    ///
    /// The optimistic value stays visible. Returns true if the record exists.
    pub fn mark_failed(&mut self, collection: Collection, id: &str) -> bool {
        match self.table_mut(collection).entities.get_mut(id) {
            Some(entity) => {
                entity.sync_status = SyncStatus::Failed;
                true
            }
            None => false,
        }
    }

    /// Folds the server's successful response to `action` into the store.
    ///
    /// Returns the number of records touched.
    pub fn apply_result(&mut self, action: &Action, result: &Value) -> usize {
        match action {
            Action::CreateJob { id, .. } | Action::UpdateJob { id, .. } => {
                self.apply_confirmed(Collection::Jobs, id, result);
                1
            }
            Action::SendMessage { id, .. } => {
                self.apply_confirmed(Collection::Messages, id, result);
                1
            }
            Action::UpdateProfile { id, .. } => {
                self.apply_confirmed(Collection::Profiles, id, result);
                1
            }
            Action::DeleteJob { id } => usize::from(self.remove(Collection::Jobs, id)),
            Action::FetchJobs { .. } | Action::FetchJob { .. } => {
                self.upsert_all(Collection::Jobs, result)
            }
            Action::FetchMessages { .. } => self.upsert_all(Collection::Messages, result),
            Action::FetchProfile { .. } => self.upsert_all(Collection::Profiles, result),
            Action::Login { .. } | Action::Logout | Action::Register { .. } => 0,
        }
    }

    /// Applies a push event. Malformed snapshots are rejected.
    pub fn apply_push(&mut self, event: &PushEvent) -> Result<()> {
        match event {
            PushEvent::Upsert { collection, entity } => self.upsert(*collection, entity),
            PushEvent::Deleted { collection, id } => {
                self.remove(*collection, id);
                Ok(())
            }
        }
    }

    /// Upserts a single snapshot or every element of an array of them,
    /// skipping malformed ones.
    fn upsert_all(&mut self, collection: Collection, result: &Value) -> usize {
        let snapshots: Vec<&Value> = match result {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        snapshots
            .into_iter()
            .filter(|snapshot| self.upsert(collection, snapshot).is_ok())
            .count()
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
