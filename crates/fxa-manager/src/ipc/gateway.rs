//! Port gateway for the `fxa-mgmt` inter-app port.

use crate::domain::error::ManagerResult;
use crate::ipc::exchange::Exchange;
use crate::ports::inbound::ReplyHandle;
use crate::router::PORT_ROUTE;
use shared_types::{Envelope, ReplyChannel};
use std::sync::atomic::Ordering;
use tracing::{debug, warn};

/// Receives port envelopes and replies on the same port.
pub struct PortGateway {
    exchange: Exchange,
}

impl PortGateway {
    pub fn new(exchange: Exchange) -> Self {
        Self { exchange }
    }

    /// Handle one `{name}` envelope from the port. `method` is not read here.
    ///
    /// The port is acquired before the collaborator is invoked, so a request
    /// that could never be answered is rejected without side effects.
    pub fn on_port_message(&self, envelope: Envelope) -> ManagerResult<Option<ReplyHandle>> {
        let stats = self.exchange.stats();
        stats.received.fetch_add(1, Ordering::Relaxed);

        let Some(operation) = self.exchange.router().resolve(&envelope, &PORT_ROUTE)?
        else {
            return Ok(None);
        };

        if let Err(e) = self.exchange.emitter().port() {
            stats.ignored.fetch_add(1, Ordering::Relaxed);
            warn!(operation = %operation, error = %e, "Dropping port message");
            return Err(e.into());
        }

        debug!(operation = %operation, "Port message routed");
        Ok(Some(self.exchange.start(operation, ReplyChannel::Port)))
    }
}
