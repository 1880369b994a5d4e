//! # Shared Bus - Event Bus for Port and RP Event Traffic
//!
//! Replaces DOM-style `addEventListener`/`dispatchEvent` with an explicit,
//! typed publish/subscribe channel.
//!
//! ```text
//! ┌──────────────┐   iac-fxa-mgmt              ┌──────────────────┐
//! │ Inter-app    │ ──────────┐                 │ FxAccountsManager│
//! │ port         │           │                 │                  │
//! └──────────────┘           ▼                 │                  │
//!                     ┌──────────────┐         │                  │
//! ┌──────────────┐    │  Event Bus   │ ──────▶ │  (subscribe)     │
//! │ Chrome       │ ─▶ │              │         │                  │
//! └──────────────┘    │              │ ◀────── │  (publish)       │
//!   RPChromeEvent     └──────────────┘         └──────────────────┘
//!                            │
//!                            ▼ RPContentEvent
//!                        content side
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{
    EventFilter, EventTopic, SystemEvent, IAC_EVENT_PREFIX, RP_CHROME_EVENT, RP_CONTENT_EVENT,
};
pub use publisher::{EventBus, EventPublisher, InMemoryEventBus};
pub use subscriber::{EventSubscriber, Subscription, SubscriptionError, SubscriptionId};

/// Events queued per subscriber before publishers wait.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
