// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ms_core::{
    Action, Changes, Database, ManualClock, OperationQueue, PushEvent, SharedClock, SharedDb,
    Store, TtlCache,
};
use serde_json::{json, Value};

use super::connectivity::{ConnectivityMonitor, HealthCheck};
use super::dispatch::Dispatcher;
use super::engine::{Engine, EngineConfig};
use super::push::{PushChannel, PushError, PushResult};
use super::transport::{Transport, TransportError, TransportResult};

/// Start time for manual clocks in tests.
pub const T0: u64 = 1_700_000_000_000;

/// A scripted server reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Echo the action's optimistic change back as the confirmed record.
    Echo,
    /// Return this value.
    Value(Value),
    /// Fail with this error.
    Fail(TransportError),
    /// Never answer.
    Hang,
}

/// Mock transport that answers from a script and records every call.
///
/// Once the script runs out it falls back to `fallback` (echo by default).
pub struct MockTransport {
    script: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Reply>,
    calls: Mutex<Vec<Action>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Reply::Echo),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A transport whose every call fails with `error`.
    pub fn failing(error: TransportError) -> Self {
        let transport = MockTransport::new();
        transport.set_fallback(Reply::Fail(error));
        transport
    }

    /// Queue a reply for the next unanswered call.
    pub fn push_reply(&self, reply: Reply) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn set_fallback(&self, reply: Reply) {
        *self.fallback.lock().unwrap() = reply;
    }

    /// Every action executed so far, in order.
    pub fn calls(&self) -> Vec<Action> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn echo(action: &Action) -> Value {
    match action.optimistic_change() {
        Some((_, _, changes)) => Value::Object(changes),
        None => Value::Null,
    }
}

impl Transport for MockTransport {
    fn execute(
        &self,
        action: &Action,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Value>> + Send + '_>> {
        self.calls.lock().unwrap().push(action.clone());
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.lock().unwrap().clone());
        let echoed = echo(action);
        Box::pin(async move {
            match reply {
                Reply::Echo => Ok(echoed),
                Reply::Value(value) => Ok(value),
                Reply::Fail(error) => Err(error),
                Reply::Hang => std::future::pending().await,
            }
        })
    }
}

/// Mock push channel fed from a script.
///
/// Connect attempts fail while `connect_failures` is positive. Once the
/// script is exhausted `recv` waits forever, like an idle socket.
pub struct MockPushChannel {
    script: VecDeque<PushResult<Option<PushEvent>>>,
    connect_failures: usize,
    connects: Arc<AtomicUsize>,
    connected: bool,
}

impl MockPushChannel {
    pub fn new() -> Self {
        MockPushChannel {
            script: VecDeque::new(),
            connect_failures: 0,
            connects: Arc::new(AtomicUsize::new(0)),
            connected: false,
        }
    }

    pub fn with_events(events: Vec<PushEvent>) -> Self {
        let mut channel = MockPushChannel::new();
        for event in events {
            channel.script.push_back(Ok(Some(event)));
        }
        channel
    }

    pub fn then(mut self, item: PushResult<Option<PushEvent>>) -> Self {
        self.script.push_back(item);
        self
    }

    pub fn failing_connects(mut self, failures: usize) -> Self {
        self.connect_failures = failures;
        self
    }

    /// Counter of connect attempts, readable after the channel moves into a
    /// listener.
    pub fn connects(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connects)
    }
}

impl Default for MockPushChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl PushChannel for MockPushChannel {
    fn connect(&mut self, _url: &str) -> Pin<Box<dyn Future<Output = PushResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.connect_failures > 0 {
                self.connect_failures -= 1;
                return Err(PushError::ConnectionFailed("mock failure".into()));
            }
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = PushResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn recv(&mut self) -> Pin<Box<dyn Future<Output = PushResult<Option<PushEvent>>> + Send + '_>> {
        Box::pin(async move {
            match self.script.pop_front() {
                Some(item) => {
                    if matches!(item, Ok(None)) {
                        self.connected = false;
                    }
                    item
                }
                None => std::future::pending().await,
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Health check that returns scripted answers, repeating the last one.
pub struct ScriptedHealthCheck {
    answers: Mutex<VecDeque<bool>>,
    last: Mutex<bool>,
    checks: Arc<AtomicUsize>,
}

impl ScriptedHealthCheck {
    pub fn new(answers: Vec<bool>) -> Self {
        ScriptedHealthCheck {
            answers: Mutex::new(answers.into()),
            last: Mutex::new(false),
            checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn checks(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.checks)
    }
}

impl HealthCheck for ScriptedHealthCheck {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock().unwrap();
        if let Some(answer) = self.answers.lock().unwrap().pop_front() {
            *last = answer;
        }
        let answer = *last;
        Box::pin(async move { answer })
    }
}

pub fn memory_db() -> SharedDb {
    Database::open_in_memory().unwrap().into_shared()
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(T0))
}

pub fn shared_clock(clock: &Arc<ManualClock>) -> SharedClock {
    Arc::clone(clock) as SharedClock
}

/// Builds a dispatcher over a fresh store.
pub fn dispatcher(transport: &Arc<MockTransport>) -> Dispatcher<MockTransport> {
    Dispatcher::new(Arc::clone(transport), Store::shared())
}

pub fn queue(db: &SharedDb, clock: &Arc<ManualClock>) -> OperationQueue {
    OperationQueue::new(db.clone(), shared_clock(clock)).unwrap()
}

pub fn cache(db: &SharedDb, clock: &Arc<ManualClock>) -> TtlCache {
    TtlCache::new(
        db.clone(),
        shared_clock(clock),
        EngineConfig::default().default_ttl,
    )
}

/// An engine over an in-memory database and a mock transport.
pub struct TestEngine {
    pub engine: Engine<MockTransport>,
    pub transport: Arc<MockTransport>,
    pub clock: Arc<ManualClock>,
}

pub fn test_engine(online: bool) -> TestEngine {
    test_engine_with(memory_db(), manual_clock(), MockTransport::new(), online)
}

pub fn test_engine_with(
    db: SharedDb,
    clock: Arc<ManualClock>,
    transport: MockTransport,
    online: bool,
) -> TestEngine {
    let transport = Arc::new(transport);
    let engine = Engine::open(
        db,
        shared_clock(&clock),
        Arc::clone(&transport),
        ConnectivityMonitor::new(online),
        EngineConfig::default(),
    )
    .unwrap();
    TestEngine {
        engine,
        transport,
        clock,
    }
}

pub fn changes(value: Value) -> Changes {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

pub fn title_change(title: &str) -> Changes {
    changes(json!({ "title": title }))
}

pub fn server_error() -> TransportError {
    TransportError::Rejected {
        status: 500,
        message: "internal error".into(),
    }
}
