// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Action descriptors for everything the client can ask the server to do.
//!
//! Every user intent is an [`Action`]: a kind plus a strongly-typed payload.
//! Actions are serialized as `{"kind": "jobs/updateJob", "payload": {...}}`
//! so that a queued action survives a restart and can be replayed verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::clock::Stamp;
use crate::entity::snapshot_id;
use crate::error::{Error, Result};
use crate::id::provisional_id;

/// A partial set of field changes for an entity.
pub type Changes = Map<String, Value>;

/// The normalized tables held by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Job postings.
    Jobs,
    /// Messages between clients and freelancers.
    Messages,
    /// User profiles.
    Profiles,
}

impl Collection {
    /// All collections, in display order.
    pub const ALL: [Collection; 3] = [Collection::Jobs, Collection::Messages, Collection::Profiles];

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::Messages => "messages",
            Collection::Profiles => "profiles",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jobs" => Ok(Collection::Jobs),
            "messages" => Ok(Collection::Messages),
            "profiles" => Ok(Collection::Profiles),
            _ => Err(Error::InvalidCollection(s.to_string())),
        }
    }
}

/// Fields of a job posting as submitted by its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_cents: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
}

impl JobDraft {
    /// Creates a draft with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        JobDraft {
            title: title.into(),
            description: String::new(),
            budget_cents: None,
            skills: Vec::new(),
        }
    }
}

/// Search parameters for listing jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// A request to the server, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Action {
    #[serde(rename = "jobs/createJob")]
    CreateJob { id: String, job: JobDraft },

    #[serde(rename = "jobs/updateJob")]
    UpdateJob { id: String, changes: Changes },

    #[serde(rename = "jobs/deleteJob")]
    DeleteJob { id: String },

    #[serde(rename = "jobs/fetchJobs")]
    FetchJobs {
        #[serde(default)]
        query: JobQuery,
    },

    #[serde(rename = "jobs/fetchJob")]
    FetchJob { id: String },

    #[serde(rename = "messages/sendMessage")]
    SendMessage {
        id: String,
        conversation_id: String,
        body: String,
    },

    #[serde(rename = "messages/fetchMessages")]
    FetchMessages { conversation_id: String },

    #[serde(rename = "profile/updateProfile")]
    UpdateProfile { id: String, changes: Changes },

    #[serde(rename = "profile/fetchProfile")]
    FetchProfile { id: String },

    #[serde(rename = "auth/login")]
    Login { email: String, password: String },

    #[serde(rename = "auth/logout")]
    Logout,

    #[serde(rename = "auth/register")]
    Register {
        email: String,
        password: String,
        display_name: String,
    },
}

/// The kind of an [`Action`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateJob,
    UpdateJob,
    DeleteJob,
    FetchJobs,
    FetchJob,
    SendMessage,
    FetchMessages,
    UpdateProfile,
    FetchProfile,
    Login,
    Logout,
    Register,
}

impl ActionKind {
    /// Every kind the client knows about.
    pub const ALL: [ActionKind; 12] = [
        ActionKind::CreateJob,
        ActionKind::UpdateJob,
        ActionKind::DeleteJob,
        ActionKind::FetchJobs,
        ActionKind::FetchJob,
        ActionKind::SendMessage,
        ActionKind::FetchMessages,
        ActionKind::UpdateProfile,
        ActionKind::FetchProfile,
        ActionKind::Login,
        ActionKind::Logout,
        ActionKind::Register,
    ];

    /// Returns the wire name, e.g. `jobs/updateJob`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CreateJob => "jobs/createJob",
            ActionKind::UpdateJob => "jobs/updateJob",
            ActionKind::DeleteJob => "jobs/deleteJob",
            ActionKind::FetchJobs => "jobs/fetchJobs",
            ActionKind::FetchJob => "jobs/fetchJob",
            ActionKind::SendMessage => "messages/sendMessage",
            ActionKind::FetchMessages => "messages/fetchMessages",
            ActionKind::UpdateProfile => "profile/updateProfile",
            ActionKind::FetchProfile => "profile/fetchProfile",
            ActionKind::Login => "auth/login",
            ActionKind::Logout => "auth/logout",
            ActionKind::Register => "auth/register",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidActionKind(s.to_string()))
    }
}

impl Action {
    /// Creates a job with a provisional id derived from its title.
    pub fn create_job(job: JobDraft, stamp: Stamp) -> Self {
        let id = provisional_id("job", &job.title, stamp);
        Action::CreateJob { id, job }
    }

    /// Creates a partial update to a job.
    pub fn update_job(id: impl Into<String>, changes: Changes) -> Self {
        Action::UpdateJob { id: id.into(), changes }
    }

    /// Creates a message with a provisional id derived from its body.
    pub fn send_message(
        conversation_id: impl Into<String>,
        body: impl Into<String>,
        stamp: Stamp,
    ) -> Self {
        let body = body.into();
        let id = provisional_id("msg", &body, stamp);
        Action::SendMessage {
            id,
            conversation_id: conversation_id.into(),
            body,
        }
    }

    /// Creates a partial update to a profile.
    pub fn update_profile(id: impl Into<String>, changes: Changes) -> Self {
        Action::UpdateProfile { id: id.into(), changes }
    }

    /// Returns the kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::CreateJob { .. } => ActionKind::CreateJob,
            Action::UpdateJob { .. } => ActionKind::UpdateJob,
            Action::DeleteJob { .. } => ActionKind::DeleteJob,
            Action::FetchJobs { .. } => ActionKind::FetchJobs,
            Action::FetchJob { .. } => ActionKind::FetchJob,
            Action::SendMessage { .. } => ActionKind::SendMessage,
            Action::FetchMessages { .. } => ActionKind::FetchMessages,
            Action::UpdateProfile { .. } => ActionKind::UpdateProfile,
            Action::FetchProfile { .. } => ActionKind::FetchProfile,
            Action::Login { .. } => ActionKind::Login,
            Action::Logout => ActionKind::Logout,
            Action::Register { .. } => ActionKind::Register,
        }
    }

    /// Returns the entity this action targets, if it targets exactly one.
    pub fn target(&self) -> Option<(Collection, &str)> {
        match self {
            Action::CreateJob { id, .. }
            | Action::UpdateJob { id, .. }
            | Action::DeleteJob { id }
            | Action::FetchJob { id } => Some((Collection::Jobs, id)),
            Action::SendMessage { id, .. } => Some((Collection::Messages, id)),
            Action::UpdateProfile { id, .. } | Action::FetchProfile { id } => {
                Some((Collection::Profiles, id))
            }
            Action::FetchJobs { .. }
            | Action::FetchMessages { .. }
            | Action::Login { .. }
            | Action::Logout
            | Action::Register { .. } => None,
        }
    }

    /// The server-assigned id in a create's `result`, when it differs from
    /// the provisional one the action carried.
    pub fn reassigned_id<'a>(&self, result: &'a Value) -> Option<&'a str> {
        match self {
            Action::CreateJob { id, .. } | Action::SendMessage { id, .. } => {
                snapshot_id(result).filter(|server_id| *server_id != id.as_str())
            }
            _ => None,
        }
    }

    /// Points the action at `to` if it targets `from` in `collection`.
    ///
    /// Creates are never retargeted. Returns true when the action changed.
    pub fn retarget(&mut self, collection: Collection, from: &str, to: &str) -> bool {
        let id = match (collection, self) {
            (
                Collection::Jobs,
                Action::UpdateJob { id, .. } | Action::DeleteJob { id } | Action::FetchJob { id },
            ) => id,
            (Collection::Profiles, Action::UpdateProfile { id, .. } | Action::FetchProfile { id }) => {
                id
            }
            _ => return false,
        };
        if id.as_str() != from {
            return false;
        }
        *id = to.to_string();
        true
    }

    /// The local change this action stands for, applied optimistically while
    /// the action waits in the queue.
    ///
    /// Returns `None` for actions with no local effect to anticipate.
    pub fn optimistic_change(&self) -> Option<(Collection, String, Changes)> {
        match self {
            Action::CreateJob { id, job } => {
                let mut changes = match serde_json::to_value(job) {
                    Ok(Value::Object(map)) => map,
                    _ => Changes::new(),
                };
                changes.insert("id".to_string(), Value::String(id.clone()));
                Some((Collection::Jobs, id.clone(), changes))
            }
            Action::UpdateJob { id, changes } => {
                Some((Collection::Jobs, id.clone(), changes.clone()))
            }
            Action::SendMessage {
                id,
                conversation_id,
                body,
            } => {
                let mut changes = Changes::new();
                changes.insert("id".to_string(), Value::String(id.clone()));
                changes.insert(
                    "conversation_id".to_string(),
                    Value::String(conversation_id.clone()),
                );
                changes.insert("body".to_string(), Value::String(body.clone()));
                Some((Collection::Messages, id.clone(), changes))
            }
            Action::UpdateProfile { id, changes } => {
                Some((Collection::Profiles, id.clone(), changes.clone()))
            }
            Action::DeleteJob { .. }
            | Action::FetchJobs { .. }
            | Action::FetchJob { .. }
            | Action::FetchMessages { .. }
            | Action::FetchProfile { .. }
            | Action::Login { .. }
            | Action::Logout
            | Action::Register { .. } => None,
        }
    }

    /// Cache key for read actions, `None` for anything else.
    pub fn cache_key(&self) -> Option<String> {
        match self {
            Action::FetchJobs { query } => {
                let search = query.search.as_deref().unwrap_or("");
                let page = query.page.unwrap_or(1);
                Some(format!("jobs/fetchJobs?search={search}&page={page}"))
            }
            Action::FetchJob { id } => Some(format!("jobs/fetchJob/{id}")),
            Action::FetchMessages { conversation_id } => {
                Some(format!("messages/fetchMessages/{conversation_id}"))
            }
            Action::FetchProfile { id } => Some(format!("profile/fetchProfile/{id}")),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
