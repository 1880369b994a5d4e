//! # Event Publisher
//!
//! Fans each published event out to the queues of the subscriptions whose
//! filter accepts it.

use crate::events::{EventFilter, SystemEvent};
use crate::subscriber::{EventSubscriber, Registry, Subscription, SubscriptionId};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// Waits while a matching subscriber's queue is full; nothing is dropped
    /// for a live subscriber.
    ///
    /// # Returns
    ///
    /// The number of subscriptions the event was queued for.
    async fn publish(&self, event: SystemEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// A bus that can be both published to and subscribed on.
pub trait EventBus: EventPublisher + EventSubscriber {}

impl<T: EventPublisher + EventSubscriber> EventBus for T {}

/// In-memory implementation of the event bus.
///
/// Every subscription owns a bounded `mpsc` queue of `capacity` events.
/// Filtering happens before queueing, so a subscriber only ever holds events
/// it asked for.
pub struct InMemoryEventBus {
    subscribers: Arc<Registry>,
    next_id: AtomicU64,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus whose subscriber queues hold `capacity` events.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.capacity);
        self.subscribers.insert(id, (filter.clone(), sender));

        debug!(subscription = %id, topics = ?filter.topics, keywords = ?filter.keywords, "New subscription created");

        Subscription::new(id, receiver, filter, Arc::downgrade(&self.subscribers))
    }

    /// Get the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of live subscriptions created with exactly this filter.
    #[must_use]
    pub fn subscriptions_for(&self, filter: &EventFilter) -> usize {
        self.subscribers
            .iter()
            .filter(|entry| entry.value().0 == *filter)
            .count()
    }

    /// Per-subscriber queue capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: SystemEvent) -> usize {
        let event_type = event.event_type();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        // Snapshot the targets so no map guard is held across an await.
        let mut targets: Vec<_> = self
            .subscribers
            .iter()
            .filter(|entry| entry.value().0.matches(&event))
            .map(|entry| (*entry.key(), entry.value().1.clone()))
            .collect();
        targets.sort_by_key(|(id, _)| *id);

        let mut delivered = 0;
        for (id, sender) in targets {
            if sender.capacity() == 0 {
                trace!(subscription = %id, event_type = %event_type, "Subscriber queue full, waiting");
            }
            if sender.send(event.clone()).await.is_ok() {
                delivered += 1;
            } else {
                // Receiver gone without its Drop having run yet.
                self.subscribers.remove(&id);
            }
        }

        if delivered == 0 {
            warn!(event_type = %event_type, "Event published with no matching subscribers");
        } else {
            debug!(event_type = %event_type, receivers = delivered, "Event published");
        }
        delivered
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }

    fn subscriptions_for(&self, filter: &EventFilter) -> usize {
        InMemoryEventBus::subscriptions_for(self, filter)
    }
}
