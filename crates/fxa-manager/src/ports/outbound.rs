//! Outbound ports: the external capabilities the manager drives.
//!
//! Collaborators receive a `Continuation` instead of a success/error callback
//! pair. They may settle it synchronously, from a spawned task, or never; the
//! manager never assumes more than "at most one settlement counts".

use crate::domain::error::{LoadError, PortError};
use crate::router::continuation::Continuation;
use async_trait::async_trait;
use shared_types::PortReply;
use std::sync::Arc;

/// Account-service client performing the network side of account management.
pub trait AccountClient: Send + Sync {
    /// Fetch the current account list.
    fn get_accounts(&self, done: Continuation);

    /// Terminate the current session.
    fn logout(&self, done: Continuation);
}

/// Interactive login flow.
pub trait LoginUi: Send + Sync {
    /// Run the login flow to completion.
    fn login(&self, done: Continuation);
}

/// Loads collaborator code/resources before the first dispatch.
#[async_trait]
pub trait DeferredLoader: Send + Sync {
    async fn load(&self) -> Result<(), LoadError>;
}

/// Loader for collaborators that are ready at construction time.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadyLoader;

#[async_trait]
impl DeferredLoader for ReadyLoader {
    async fn load(&self) -> Result<(), LoadError> {
        Ok(())
    }
}

/// A named inter-app message port.
pub trait MessagePort: Send + Sync {
    fn name(&self) -> &str;

    /// Write one reply to the port.
    fn post_message(&self, reply: PortReply) -> Result<(), PortError>;
}

/// Opens named inter-app ports.
pub trait PortConnector: Send + Sync {
    fn connect(&self, name: &str) -> Result<Arc<dyn MessagePort>, PortError>;
}
