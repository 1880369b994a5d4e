//! # Event Subscriber
//!
//! A subscription is the receiving end of its own bounded queue. The bus only
//! queues events the subscription's filter accepts, and never drops one for a
//! live subscription, so `recv` yields every matching event in publish order.

use crate::events::{EventFilter, SystemEvent};
use dashmap::DashMap;
use std::fmt;
use std::sync::Weak;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Live subscriptions, keyed by id.
pub(crate) type Registry = DashMap<SubscriptionId, (EventFilter, mpsc::Sender<SystemEvent>)>;

/// Identifies one subscription on one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was dropped and the queue is drained.
    #[error("Event bus closed")]
    Closed,
}

/// Trait for subscribing to events from the bus.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events matching a filter.
    fn subscribe(&self, filter: EventFilter) -> Subscription;

    /// Number of live subscriptions created with exactly this filter.
    fn subscriptions_for(&self, filter: &EventFilter) -> usize;
}

/// Receiving handle for one subscription. Unregisters itself on drop.
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<SystemEvent>,
    filter: EventFilter,
    registry: Weak<Registry>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        receiver: mpsc::Receiver<SystemEvent>,
        filter: EventFilter,
        registry: Weak<Registry>,
    ) -> Self {
        Self {
            id,
            receiver,
            filter,
            registry,
        }
    }

    /// Next matching event, or `None` once the bus is gone and the queue is
    /// empty.
    pub async fn recv(&mut self) -> Option<SystemEvent> {
        self.receiver.recv().await
    }

    /// Next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Result<Option<SystemEvent>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }

    /// Events queued and not yet received.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.id);
        }
        debug!(subscription = %self.id, "Subscription dropped");
    }
}
