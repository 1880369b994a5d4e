//! # Reply Formatter
//!
//! Renders an `Outcome` into the wire shape of the channel it came in on.
//!
//! | Channel | Success               | Failure                |
//! |---------|-----------------------|------------------------|
//! | Port    | `{data: X}`           | `{error: X}`           |
//! | Relay   | `{id, data: X}`       | `{id, error: X}`       |
//!
//! Formatting is pure: the payload is moved into the reply, never re-encoded.

use crate::envelope::RpId;
use crate::outcome::{Outcome, Payload};
use serde::{Deserialize, Serialize};

/// Reply written back on the `fxa-mgmt` port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortReply {
    Data(Payload),
    Error(Payload),
}

impl PortReply {
    pub fn is_error(&self) -> bool {
        matches!(self, PortReply::Error(_))
    }

    pub fn payload(&self) -> &Payload {
        match self {
            PortReply::Data(p) | PortReply::Error(p) => p,
        }
    }
}

impl From<Outcome> for PortReply {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success(p) => PortReply::Data(p),
            Outcome::Failure(p) => PortReply::Error(p),
        }
    }
}

/// Detail of the `mozFxAccountsRPContentEvent` dispatched for an RP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentReply {
    pub id: RpId,
    #[serde(flatten)]
    pub reply: PortReply,
}

impl ContentReply {
    pub fn new(id: RpId, outcome: Outcome) -> Self {
        Self {
            id,
            reply: outcome.into(),
        }
    }
}

/// Channel a reply is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyChannel {
    /// The `fxa-mgmt` inter-app port.
    Port,
    /// The RP content event, correlated by id.
    Relay(RpId),
}

impl ReplyChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyChannel::Port => "port",
            ReplyChannel::Relay(_) => "relay",
        }
    }

    /// Correlation id carried by replies on this channel.
    pub fn id(&self) -> Option<RpId> {
        match self {
            ReplyChannel::Port => None,
            ReplyChannel::Relay(id) => Some(*id),
        }
    }
}

/// A rendered reply, ready to be handed to its transport.
#[derive(Debug, Clone, PartialEq)]
pub enum WireReply {
    Port(PortReply),
    Content(ContentReply),
}

/// Render `outcome` for `channel`.
pub fn format_reply(channel: ReplyChannel, outcome: Outcome) -> WireReply {
    match channel {
        ReplyChannel::Port => WireReply::Port(outcome.into()),
        ReplyChannel::Relay(id) => WireReply::Content(ContentReply::new(id, outcome)),
    }
}
