// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Decides which actions may be deferred while offline.
//!
//! Only entity-creation and entity-update style mutations are queueable.
//! Authentication is never deferred (stale credentials and session races),
//! and reads are re-issued on demand instead of replayed later. Anything the
//! client does not recognize is not queueable.
//!
//! Kind strings may carry a lifecycle phase suffix (`/pending`, `/fulfilled`,
//! `/rejected`). Only the attempt itself (no suffix, or `/pending`) is a
//! candidate for queueing; results are not.

use std::str::FromStr;

use crate::action::ActionKind;

/// Lifecycle phase appended to a kind string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Fulfilled,
    Rejected,
}

impl Phase {
    fn from_suffix(s: &str) -> Option<Phase> {
        match s {
            "pending" => Some(Phase::Pending),
            "fulfilled" => Some(Phase::Fulfilled),
            "rejected" => Some(Phase::Rejected),
            _ => None,
        }
    }
}

impl ActionKind {
    /// The allow-list of deferrable mutations.
    pub fn is_queueable(&self) -> bool {
        match self {
            ActionKind::CreateJob
            | ActionKind::UpdateJob
            | ActionKind::SendMessage
            | ActionKind::UpdateProfile => true,
            ActionKind::DeleteJob
            | ActionKind::FetchJobs
            | ActionKind::FetchJob
            | ActionKind::FetchMessages
            | ActionKind::FetchProfile
            | ActionKind::Login
            | ActionKind::Logout
            | ActionKind::Register => false,
        }
    }

    /// True for side-effect-free requests.
    pub fn is_read(&self) -> bool {
        matches!(
            self,
            ActionKind::FetchJobs
                | ActionKind::FetchJob
                | ActionKind::FetchMessages
                | ActionKind::FetchProfile
        )
    }

    /// True for authentication requests.
    pub fn is_auth(&self) -> bool {
        matches!(self, ActionKind::Login | ActionKind::Logout | ActionKind::Register)
    }
}

/// Splits a kind string into its kind and optional phase suffix.
///
/// Returns `None` when the kind is not recognized.
pub fn parse_kind(kind: &str) -> Option<(ActionKind, Option<Phase>)> {
    if let Ok(parsed) = ActionKind::from_str(kind) {
        return Some((parsed, None));
    }

    let (base, suffix) = kind.rsplit_once('/')?;
    let phase = Phase::from_suffix(suffix)?;
    let parsed = ActionKind::from_str(base).ok()?;
    Some((parsed, Some(phase)))
}

/// Returns true when an attempted action of this kind may be queued offline.
pub fn is_queueable(kind: &str) -> bool {
    match parse_kind(kind) {
        Some((parsed, None | Some(Phase::Pending))) => parsed.is_queueable(),
        Some((_, Some(Phase::Fulfilled | Phase::Rejected))) | None => false,
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
