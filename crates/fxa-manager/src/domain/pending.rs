//! In-flight request tracking.
//!
//! Every routed envelope is registered here until its reply is emitted. There
//! is no timeout or cancellation: a collaborator that never settles leaves its
//! entry behind, and `stale()` is how that hang becomes visible.

use dashmap::DashMap;
use shared_types::{Operation, ReplyChannel};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How an in-flight request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The reply was written to its channel.
    Replied,
    /// The collaborator dropped its continuation without settling.
    Abandoned,
    /// An outcome arrived but the channel rejected the reply.
    Undeliverable,
}

/// Handle identifying one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A request waiting on its collaborator.
#[derive(Debug, Clone)]
pub struct InFlight {
    pub operation: Operation,
    pub channel: ReplyChannel,
    pub started_at: Instant,
}

/// Counters for the relay
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Envelopes received on either channel
    pub received: AtomicU64,
    /// Envelopes dropped before routing (unknown operation, missing id, no port)
    pub ignored: AtomicU64,
    /// Replies emitted
    pub replied: AtomicU64,
    /// Settlements discarded because the continuation had already fired
    pub duplicate_settlements: AtomicU64,
    /// Continuations dropped unsettled
    pub abandoned: AtomicU64,
    /// Outcomes whose reply could not be written
    pub undeliverable: AtomicU64,
}

/// Point-in-time copy of `RelayStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub ignored: u64,
    pub replied: u64,
    pub duplicate_settlements: u64,
    pub abandoned: u64,
    pub undeliverable: u64,
}

impl RelayStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            replied: self.replied.load(Ordering::Relaxed),
            duplicate_settlements: self.duplicate_settlements.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            undeliverable: self.undeliverable.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Requests routed to a collaborator that have not finished yet.
    pub fn in_flight(&self) -> u64 {
        self.received
            .saturating_sub(self.ignored)
            .saturating_sub(self.replied)
            .saturating_sub(self.abandoned)
            .saturating_sub(self.undeliverable)
    }
}

/// Registry of requests awaiting a collaborator outcome.
pub struct InFlightRequests {
    pending: DashMap<Ticket, InFlight>,
    next_ticket: AtomicU64,
}

impl InFlightRequests {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Register a routed request.
    pub fn register(&self, operation: Operation, channel: ReplyChannel) -> Ticket {
        let ticket = Ticket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        self.pending.insert(
            ticket,
            InFlight {
                operation,
                channel,
                started_at: Instant::now(),
            },
        );

        debug!(
            ticket = ticket.0,
            operation = %operation,
            channel = channel.as_str(),
            "Registered in-flight request"
        );

        ticket
    }

    /// Mark a request finished.
    ///
    /// Returns false if the ticket was unknown or already finished.
    pub fn finish(&self, ticket: Ticket, resolution: Resolution) -> bool {
        match self.pending.remove(&ticket) {
            Some((_, request)) => {
                debug!(
                    ticket = ticket.0,
                    operation = %request.operation,
                    channel = request.channel.as_str(),
                    resolution = ?resolution,
                    elapsed_ms = request.started_at.elapsed().as_millis(),
                    "Finished in-flight request"
                );
                true
            }
            None => {
                warn!(ticket = ticket.0, "Finish for unknown ticket");
                false
            }
        }
    }

    /// Requests that have been waiting longer than `age`.
    pub fn stale(&self, age: Duration) -> Vec<(Ticket, InFlight)> {
        let now = Instant::now();
        self.pending
            .iter()
            .filter(|entry| now.duration_since(entry.value().started_at) > age)
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    pub fn is_pending(&self, ticket: &Ticket) -> bool {
        self.pending.contains_key(ticket)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for InFlightRequests {
    fn default() -> Self {
        Self::new()
    }
}
