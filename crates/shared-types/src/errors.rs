//! # Error Types
//!
//! Errors raised while interpreting inbound envelopes.

use thiserror::Error;

/// Errors that can occur when reading an inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Neither `name` nor `method` was present.
    #[error("Envelope carries no operation name")]
    MissingOperation,

    /// The operation name is outside the supported set.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// A relay envelope arrived without a correlation id.
    #[error("Envelope for operation {operation} carries no correlation id")]
    MissingId { operation: String },

    /// The envelope could not be decoded.
    #[error("Malformed envelope: {0}")]
    Malformed(String),
}
