//! Reply emission on the two outbound channels.
//!
//! Port replies go to the lazily connected `fxa-mgmt` port, which is kept for
//! every later request. Content replies are published on the bus as
//! `mozFxAccountsRPContentEvent`.

use crate::domain::error::PortError;
use crate::ports::outbound::{MessagePort, PortConnector};
use parking_lot::Mutex;
use shared_bus::{EventBus, SystemEvent};
use shared_types::WireReply;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Writes rendered replies to their transport.
pub struct ReplyEmitter {
    connector: Arc<dyn PortConnector>,
    port_name: String,
    port: Mutex<Option<Arc<dyn MessagePort>>>,
    bus: Arc<dyn EventBus>,
}

impl ReplyEmitter {
    pub fn new(
        connector: Arc<dyn PortConnector>,
        port_name: impl Into<String>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            connector,
            port_name: port_name.into(),
            port: Mutex::new(None),
            bus,
        }
    }

    /// The management port, connecting on first use.
    pub fn port(&self) -> Result<Arc<dyn MessagePort>, PortError> {
        let mut slot = self.port.lock();
        if let Some(port) = slot.as_ref() {
            return Ok(port.clone());
        }

        let port = self.connector.connect(&self.port_name)?;
        info!(port = %self.port_name, "Connected management port");
        *slot = Some(port.clone());
        Ok(port)
    }

    pub fn has_port(&self) -> bool {
        self.port.lock().is_some()
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Hand one reply to its transport.
    pub async fn emit(&self, reply: WireReply) -> Result<(), PortError> {
        match reply {
            WireReply::Port(reply) => {
                let port = self.port()?;
                let is_error = reply.is_error();
                if let Err(e) = port.post_message(reply) {
                    if matches!(e, PortError::Closed(_)) {
                        // Reconnect on the next request.
                        self.port.lock().take();
                    }
                    return Err(e);
                }
                debug!(port = port.name(), is_error = is_error, "Posted port reply");
                Ok(())
            }
            WireReply::Content(reply) => {
                let rp_id = reply.id;
                let receivers = self.bus.publish(SystemEvent::RpContent(reply)).await;
                if receivers == 0 {
                    warn!(rp_id = %rp_id, "Content reply published with no listeners");
                } else {
                    debug!(rp_id = %rp_id, receivers = receivers, "Published content reply");
                }
                Ok(())
            }
        }
    }
}
