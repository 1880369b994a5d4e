//! # Inbound Envelope
//!
//! The message shape received on both inbound channels.
//!
//! - Port channel: `{name: "getAccounts"}`; no correlation id, the port is 1:1.
//! - Chrome channel: `{id: 123, method: "openFlow"}`; `id` is mandatory.
//!
//! Each channel reads its operation from exactly one field (`OperationField`);
//! the other field is ignored even when present.
//!
//! Envelopes are immutable once received; fields are only readable.

use crate::errors::EnvelopeError;
use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation token of an RP request, echoed unchanged on the reply.
///
/// Only non-negative integers up to `u64::MAX` are accepted. A negative,
/// fractional or non-numeric `id` fails to decode with
/// `EnvelopeError::Malformed`, so such a request is never routed and gets no
/// reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RpId(u64);

impl RpId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RpId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The envelope field an inbound channel reads its operation from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationField {
    /// `name`, used on the `fxa-mgmt` port.
    Name,
    /// `method`, used on the RP chrome channel.
    Method,
}

impl OperationField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Method => "method",
        }
    }
}

impl fmt::Display for OperationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inbound request envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RpId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
}

impl Envelope {
    /// Envelope as delivered on the `fxa-mgmt` port.
    pub fn port(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            id: None,
            method: None,
        }
    }

    /// Envelope as delivered by the privileged chrome event.
    pub fn chrome(id: impl Into<RpId>, method: impl Into<String>) -> Self {
        Self {
            name: None,
            id: Some(id.into()),
            method: Some(method.into()),
        }
    }

    /// Decode an envelope from JSON.
    ///
    /// Accepts both a bare envelope object and a DOM-style `{detail: {...}}`
    /// wrapper.
    pub fn from_json(value: serde_json::Value) -> Result<Self, EnvelopeError> {
        let inner = match value {
            serde_json::Value::Object(mut map) if map.contains_key("detail") => map
                .remove("detail")
                .unwrap_or(serde_json::Value::Null),
            other => other,
        };
        serde_json::from_value(inner).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn id(&self) -> Option<RpId> {
        self.id
    }

    /// The operation name carried in `field`. No fallback to the other field.
    pub fn operation_name(&self, field: OperationField) -> Option<&str> {
        match field {
            OperationField::Name => self.name(),
            OperationField::Method => self.method(),
        }
    }

    /// Resolve the operation in `field` against the closed set.
    pub fn operation(&self, field: OperationField) -> Result<Operation, EnvelopeError> {
        self.operation_name(field)
            .ok_or(EnvelopeError::MissingOperation)?
            .parse()
    }

    /// The correlation id, required on the relay channel.
    pub fn require_id(&self) -> Result<RpId, EnvelopeError> {
        self.id.ok_or_else(|| EnvelopeError::MissingId {
            operation: self.method().unwrap_or_default().to_string(),
        })
    }
}
