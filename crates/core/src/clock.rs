// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Clock sources and monotonic stamps.
//!
//! A [`Stamp`] pairs a wall clock reading with a logical counter so that two
//! operations enqueued within the same millisecond (or across a backwards
//! clock step) still sort in the order they were created.
//!
//! Format: `{wall_ms}-{counter}`
//!
//! Ordering rules:
//! 1. Higher wall_ms wins
//! 2. If wall_ms equal, higher counter wins

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// A monotonic timestamp used as a queue identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stamp {
    /// Wall clock time in milliseconds since Unix epoch.
    pub wall_ms: u64,
    /// Logical counter for ordering stamps taken at the same wall time.
    pub counter: u32,
}

impl Stamp {
    /// Creates a new stamp with the given components.
    pub fn new(wall_ms: u64, counter: u32) -> Self {
        Stamp { wall_ms, counter }
    }

    /// Parses a stamp from its string representation.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Wall clock component as a UTC datetime.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let ms = i64::try_from(self.wall_ms).unwrap_or(i64::MAX);
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
    }
}

impl Ord for Stamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall_ms
            .cmp(&other.wall_ms)
            .then_with(|| self.counter.cmp(&other.counter))
    }
}

impl PartialOrd for Stamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.wall_ms, self.counter)
    }
}

impl FromStr for Stamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (wall, counter) = s.split_once('-').ok_or_else(|| {
            Error::InvalidStamp(format!("expected format 'wall_ms-counter', got '{s}'"))
        })?;

        let wall_ms = wall
            .parse::<u64>()
            .map_err(|_| Error::InvalidStamp(format!("invalid wall_ms '{wall}' in '{s}'")))?;

        let counter = counter
            .parse::<u32>()
            .map_err(|_| Error::InvalidStamp(format!("invalid counter '{counter}' in '{s}'")))?;

        Ok(Stamp::new(wall_ms, counter))
    }
}

/// Trait for getting the current wall clock time.
///
/// This allows injecting a manual clock for testing expiry and ordering.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Clock handle shared between the queue, the cache and the engine.
pub type SharedClock = Arc<dyn ClockSource>;

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    /// Creates a manual clock starting at the given time.
    pub fn new(start_ms: u64) -> Self {
        ManualClock { now_ms: AtomicU64::new(start_ms) }
    }

    /// Moves the clock forward.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, AtomicOrdering::SeqCst);
    }

    /// Sets the clock to an absolute time (may go backwards).
    pub fn set(&self, ms: u64) {
        self.now_ms.store(ms, AtomicOrdering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(AtomicOrdering::SeqCst)
    }
}

/// Produces strictly increasing [`Stamp`]s from a clock source.
///
/// Guarantees monotonic output even if the underlying clock stalls or goes
/// backwards.
pub struct StampClock<C: ClockSource> {
    clock: C,
    last: Mutex<Stamp>,
}

impl<C: ClockSource> StampClock<C> {
    /// Creates a stamp clock with a custom clock source.
    pub fn with_clock(clock: C) -> Self {
        StampClock { clock, last: Mutex::new(Stamp::new(0, 0)) }
    }

    /// Current wall time of the underlying clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Generates the next stamp.
    pub fn next(&self) -> Stamp {
        let physical = self.clock.now_ms();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let next = if physical > last.wall_ms {
            Stamp::new(physical, 0)
        } else {
            Stamp::new(last.wall_ms, last.counter.saturating_add(1))
        };

        *last = next;
        next
    }

    /// Advances the clock past a stamp observed elsewhere (e.g. read back
    /// from disk after a restart).
    pub fn observe(&self, seen: Stamp) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if seen > *last {
            *last = seen;
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
