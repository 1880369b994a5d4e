//! # System Events
//!
//! Defines the event types that flow through the shared bus.
//!
//! Three event families cross this bus:
//!
//! - `iac-<keyword>`: an inter-app message received on a named port.
//! - `mozFxAccountsRPChromeEvent`: a privileged RP request from chrome.
//! - `mozFxAccountsRPContentEvent`: the correlated reply back to content.

use serde::{Deserialize, Serialize};
use shared_types::{ContentReply, Envelope};
use std::borrow::Cow;

/// Event type of privileged RP requests.
pub const RP_CHROME_EVENT: &str = "mozFxAccountsRPChromeEvent";

/// Event type of RP replies dispatched to content.
pub const RP_CONTENT_EVENT: &str = "mozFxAccountsRPContentEvent";

/// Prefix of inter-app message event types.
pub const IAC_EVENT_PREFIX: &str = "iac-";

/// All events that can be published to the bus.
#[derive(Debug, Clone)]
pub enum SystemEvent {
    /// An inter-app message arrived on the port registered for `keyword`.
    IacMessage {
        /// Port keyword, e.g. `fxa-mgmt`.
        keyword: String,
        /// The message body.
        detail: Envelope,
    },

    /// A relying party asked chrome to run an FxA method.
    RpChrome(Envelope),

    /// Reply to an earlier `RpChrome` request, correlated by id.
    RpContent(ContentReply),
}

impl SystemEvent {
    /// Build an inter-app message event.
    pub fn iac(keyword: impl Into<String>, detail: Envelope) -> Self {
        Self::IacMessage {
            keyword: keyword.into(),
            detail,
        }
    }

    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::IacMessage { .. } => EventTopic::Iac,
            Self::RpChrome(_) => EventTopic::RpChrome,
            Self::RpContent(_) => EventTopic::RpContent,
        }
    }

    /// Port keyword, for inter-app messages only.
    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        match self {
            Self::IacMessage { keyword, .. } => Some(keyword),
            _ => None,
        }
    }

    /// DOM-style event type string.
    #[must_use]
    pub fn event_type(&self) -> Cow<'static, str> {
        match self {
            Self::IacMessage { keyword, .. } => Cow::Owned(format!("{IAC_EVENT_PREFIX}{keyword}")),
            Self::RpChrome(_) => Cow::Borrowed(RP_CHROME_EVENT),
            Self::RpContent(_) => Cow::Borrowed(RP_CONTENT_EVENT),
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Inter-app port messages.
    Iac,
    /// RP requests from chrome.
    RpChrome,
    /// RP replies to content.
    RpContent,
    /// All events (no filtering).
    All,
}

impl EventTopic {
    /// The topic replies to this topic are published on.
    ///
    /// Only chrome requests have a content-side counterpart; port traffic is
    /// answered on the port itself.
    #[must_use]
    pub fn counterpart(&self) -> Option<EventTopic> {
        match self {
            EventTopic::RpChrome => Some(EventTopic::RpContent),
            _ => None,
        }
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Port keywords to include. Empty means all keywords.
    pub keywords: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            keywords: Vec::new(),
        }
    }

    /// Create a filter for inter-app messages on one port keyword.
    #[must_use]
    pub fn iac(keyword: impl Into<String>) -> Self {
        Self {
            topics: vec![EventTopic::Iac],
            keywords: vec![keyword.into()],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SystemEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let keyword_match = self.keywords.is_empty()
            || event
                .keyword()
                .is_some_and(|k| self.keywords.iter().any(|w| w == k));

        topic_match && keyword_match
    }

    /// Key used to count subscriptions sharing this filter.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{:?}/{:?}", self.topics, self.keywords)
    }
}
