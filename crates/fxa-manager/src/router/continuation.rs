//! Single-use continuation handed to collaborators.
//!
//! A `Continuation` replaces the success/error callback pair. Clones share one
//! latch: the first `settle` wins, every later one is counted in
//! `RelayStats::duplicate_settlements` and dropped. If every clone is dropped
//! unsettled, the waiting `Settlement` resolves to `None`.

use crate::domain::pending::RelayStats;
use parking_lot::Mutex;
use shared_types::{Operation, Outcome, Payload};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

struct Latch {
    sender: Mutex<Option<oneshot::Sender<Outcome>>>,
    operation: Operation,
    stats: Arc<RelayStats>,
}

/// Completion handle for one collaborator call.
#[derive(Clone)]
pub struct Continuation {
    latch: Arc<Latch>,
}

/// Receiving side of a `Continuation`.
pub struct Settlement {
    receiver: oneshot::Receiver<Outcome>,
    operation: Operation,
}

impl Continuation {
    /// Create a continuation and the settlement that observes it.
    pub fn channel(operation: Operation, stats: Arc<RelayStats>) -> (Continuation, Settlement) {
        let (tx, rx) = oneshot::channel();
        let continuation = Continuation {
            latch: Arc::new(Latch {
                sender: Mutex::new(Some(tx)),
                operation,
                stats,
            }),
        };
        let settlement = Settlement {
            receiver: rx,
            operation,
        };
        (continuation, settlement)
    }

    /// Success continuation.
    pub fn succeed(&self, payload: impl Into<Payload>) -> bool {
        self.settle(Outcome::Success(payload.into()))
    }

    /// Error continuation.
    pub fn fail(&self, reason: impl Into<Payload>) -> bool {
        self.settle(Outcome::Failure(reason.into()))
    }

    /// Settle with `outcome`.
    ///
    /// Returns true if this call won the latch.
    pub fn settle(&self, outcome: Outcome) -> bool {
        let Some(sender) = self.latch.sender.lock().take() else {
            self.latch
                .stats
                .duplicate_settlements
                .fetch_add(1, Ordering::Relaxed);
            warn!(
                operation = %self.latch.operation,
                outcome = outcome.tag(),
                "Ignoring repeated settlement"
            );
            return false;
        };

        if sender.send(outcome).is_err() {
            debug!(
                operation = %self.latch.operation,
                "Settlement arrived after the requester went away"
            );
        }
        true
    }

    /// Split into independent success and error callbacks sharing this latch.
    pub fn callbacks(
        &self,
    ) -> (
        impl Fn(Payload) + Send + Sync + 'static,
        impl Fn(Payload) + Send + Sync + 'static,
    ) {
        let on_success = self.clone();
        let on_error = self.clone();
        (
            move |payload| {
                on_success.succeed(payload);
            },
            move |reason| {
                on_error.fail(reason);
            },
        )
    }

    pub fn is_settled(&self) -> bool {
        self.latch.sender.lock().is_none()
    }

    pub fn operation(&self) -> Operation {
        self.latch.operation
    }
}

impl Settlement {
    /// Wait for the winning settlement.
    ///
    /// `None` if every continuation clone was dropped without settling.
    pub async fn outcome(self) -> Option<Outcome> {
        match self.receiver.await {
            Ok(outcome) => Some(outcome),
            Err(_) => {
                warn!(
                    operation = %self.operation,
                    "Collaborator dropped its continuation without settling; no reply will be sent"
                );
                None
            }
        }
    }
}
