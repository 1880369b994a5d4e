//! Inbound port: the API the two listeners drive.

use crate::domain::error::ManagerResult;
use shared_types::Envelope;
use tokio::task::JoinHandle;

/// Handle to the task that will emit the reply for one envelope.
pub type ReplyHandle = JoinHandle<()>;

/// Entry points of the account manager.
///
/// Both methods return as soon as the request is routed; the reply is emitted
/// later from the returned task. `Ok(None)` means the envelope was dropped
/// without invoking any collaborator.
///
/// Callable from any thread. Reply tasks run on the runtime the implementor
/// captured when it was built, not on the caller's.
pub trait AccountManagerApi: Send + Sync {
    /// Handle a message received on the management port.
    fn on_port_message(&self, envelope: Envelope) -> ManagerResult<Option<ReplyHandle>>;

    /// Handle a privileged RP chrome event.
    fn handle_event(&self, envelope: Envelope) -> ManagerResult<Option<ReplyHandle>>;
}
