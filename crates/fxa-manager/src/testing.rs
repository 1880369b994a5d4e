//! Scripted collaborators and recording ports for tests.
//!
//! Enabled for this crate's unit tests and, through the `testing` feature,
//! for downstream integration tests.

use crate::domain::error::{LoadError, PortError};
use crate::ports::outbound::{AccountClient, DeferredLoader, LoginUi, MessagePort, PortConnector};
use crate::router::continuation::Continuation;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Outcome, Payload, PortReply, FXA_MGMT_PORT};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// How a scripted collaborator settles its continuation.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Settle with success immediately.
    Succeed(Payload),
    /// Settle with failure immediately.
    Fail(Payload),
    /// Misbehave: call the success continuation, then the error one.
    SucceedThenFail(Payload, Payload),
    /// Keep the continuation until `release` is called.
    Hold,
    /// Drop the continuation without settling.
    Abandon,
    /// Settle from a spawned task after a delay.
    Delayed(Duration, Outcome),
}

#[derive(Default)]
struct Script {
    calls: Mutex<Vec<&'static str>>,
    held: Mutex<Vec<Continuation>>,
}

impl Script {
    fn run(&self, call: &'static str, behavior: &Behavior, done: Continuation) {
        self.calls.lock().push(call);
        match behavior {
            Behavior::Succeed(payload) => {
                done.succeed(payload.clone());
            }
            Behavior::Fail(reason) => {
                done.fail(reason.clone());
            }
            Behavior::SucceedThenFail(payload, reason) => {
                done.succeed(payload.clone());
                done.fail(reason.clone());
            }
            Behavior::Hold => self.held.lock().push(done),
            Behavior::Abandon => drop(done),
            Behavior::Delayed(delay, outcome) => {
                let delay = *delay;
                let outcome = outcome.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    done.settle(outcome);
                });
            }
        }
    }

    fn release(&self, outcome: Outcome) -> usize {
        let held: Vec<_> = self.held.lock().drain(..).collect();
        for done in &held {
            done.settle(outcome.clone());
        }
        held.len()
    }
}

/// Account client whose calls settle according to a `Behavior`.
pub struct ScriptedAccountClient {
    behavior: Behavior,
    script: Script,
}

impl ScriptedAccountClient {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            script: Script::default(),
        }
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.script.calls.lock().clone()
    }

    /// Settle every held continuation with `outcome`.
    pub fn release(&self, outcome: Outcome) -> usize {
        self.script.release(outcome)
    }

    pub fn held(&self) -> usize {
        self.script.held.lock().len()
    }
}

impl AccountClient for ScriptedAccountClient {
    fn get_accounts(&self, done: Continuation) {
        self.script.run("getAccounts", &self.behavior, done);
    }

    fn logout(&self, done: Continuation) {
        self.script.run("logout", &self.behavior, done);
    }
}

/// Login UI whose flow settles according to a `Behavior`.
pub struct ScriptedLoginUi {
    behavior: Behavior,
    script: Script,
}

impl ScriptedLoginUi {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            script: Script::default(),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.script.calls.lock().clone()
    }

    pub fn release(&self, outcome: Outcome) -> usize {
        self.script.release(outcome)
    }

    pub fn held(&self) -> usize {
        self.script.held.lock().len()
    }
}

impl LoginUi for ScriptedLoginUi {
    fn login(&self, done: Continuation) {
        self.script.run("login", &self.behavior, done);
    }
}

/// Message port that records every reply posted to it.
pub struct RecordingPort {
    name: String,
    messages: Mutex<Vec<PortReply>>,
    closed: AtomicBool,
    posted: Notify,
}

impl RecordingPort {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            posted: Notify::new(),
        }
    }

    pub fn messages(&self) -> Vec<PortReply> {
        self.messages.lock().clone()
    }

    /// Make every later `post_message` fail with `PortError::Closed`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Wait until at least `count` replies have been posted.
    pub async fn wait_for(&self, count: usize) -> Vec<PortReply> {
        loop {
            let mut notified = std::pin::pin!(self.posted.notified());
            notified.as_mut().enable();
            {
                let messages = self.messages.lock();
                if messages.len() >= count {
                    return messages.clone();
                }
            }
            notified.await;
        }
    }
}

impl MessagePort for RecordingPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn post_message(&self, reply: PortReply) -> Result<(), PortError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PortError::Closed(self.name.clone()));
        }
        self.messages.lock().push(reply);
        self.posted.notify_waiters();
        Ok(())
    }
}

/// Connector handing out a single shared `RecordingPort`.
pub struct RecordingConnector {
    port: Arc<RecordingPort>,
    available: bool,
    connects: AtomicUsize,
}

impl RecordingConnector {
    /// Connector for the `fxa-mgmt` port.
    pub fn new() -> Self {
        Self::named(FXA_MGMT_PORT)
    }

    pub fn named(name: &str) -> Self {
        Self {
            port: Arc::new(RecordingPort::new(name)),
            available: true,
            connects: AtomicUsize::new(0),
        }
    }

    /// Connector whose every `connect` fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn port(&self) -> Arc<RecordingPort> {
        self.port.clone()
    }

    /// Number of `connect` calls made.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Default for RecordingConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl PortConnector for RecordingConnector {
    fn connect(&self, name: &str) -> Result<Arc<dyn MessagePort>, PortError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.available || name != self.port.name() {
            return Err(PortError::Unavailable(name.to_string()));
        }
        Ok(self.port.clone())
    }
}

/// Loader that counts its invocations.
pub struct CountingLoader {
    failure: Option<LoadError>,
    loads: AtomicUsize,
}

impl CountingLoader {
    pub fn ready() -> Self {
        Self {
            failure: None,
            loads: AtomicUsize::new(0),
        }
    }

    /// Loader that always fails with `resource`/`reason`.
    pub fn failing(resource: &str, reason: &str) -> Self {
        Self {
            failure: Some(LoadError::new(resource, reason)),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeferredLoader for CountingLoader {
    async fn load(&self) -> Result<(), LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}
