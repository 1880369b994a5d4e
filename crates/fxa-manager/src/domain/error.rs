//! Manager error types.
//!
//! Collaborator failures are not errors at this layer: they are opaque values
//! forwarded to the requester as `{error: reason}`. The types here cover what
//! the relay itself can get wrong.

use shared_types::EnvelopeError;
use thiserror::Error;

/// Errors surfaced by the manager to its callers.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The operation name is not routable on this channel and the configured
    /// policy asks for an explicit error.
    #[error("unknown operation '{name}' on {channel} channel")]
    UnknownOperation { name: String, channel: &'static str },

    /// The envelope could not be interpreted.
    #[error("invalid envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    /// The reply port could not be obtained or written.
    #[error("port error: {0}")]
    Port(#[from] PortError),

    /// Listeners were already registered on the bus.
    #[error("listeners already registered")]
    AlreadyStarted,

    /// Constructed outside a tokio runtime and no runtime handle was given.
    #[error("no tokio runtime available")]
    NoRuntime,

    /// Configuration rejected at construction time.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the inter-app port layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    /// No port with this name could be connected.
    #[error("port '{0}' unavailable")]
    Unavailable(String),

    /// The port was closed by the remote side.
    #[error("port '{0}' closed")]
    Closed(String),
}

/// Errors from deferred collaborator loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load {resource}: {reason}")]
pub struct LoadError {
    pub resource: String,
    pub reason: String,
}

impl LoadError {
    pub fn new(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("port name cannot be empty")]
    EmptyPortName,

    #[error("bus capacity cannot be 0")]
    ZeroCapacity,

    #[error("invalid unknown-operation policy: {0}")]
    InvalidPolicy(String),
}

/// Result type for manager operations
pub type ManagerResult<T> = Result<T, ManagerError>;
