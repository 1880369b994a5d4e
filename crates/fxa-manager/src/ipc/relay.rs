//! Chrome event relay.
//!
//! Turns a `mozFxAccountsRPChromeEvent` into a collaborator call and answers
//! with one `mozFxAccountsRPContentEvent` carrying the same id. Only
//! `openFlow` is wired on this channel.

use crate::domain::error::ManagerResult;
use crate::ipc::exchange::Exchange;
use crate::ports::inbound::ReplyHandle;
use crate::router::RELAY_ROUTE;
use shared_types::{Envelope, ReplyChannel};
use std::sync::atomic::Ordering;
use tracing::{debug, warn};

/// Relays RP chrome requests to the login flow.
pub struct ChromeEventRelay {
    exchange: Exchange,
}

impl ChromeEventRelay {
    pub fn new(exchange: Exchange) -> Self {
        Self { exchange }
    }

    /// Handle one `{id, method}` chrome event. `name` is not read here.
    pub fn handle_event(&self, envelope: Envelope) -> ManagerResult<Option<ReplyHandle>> {
        let stats = self.exchange.stats();
        stats.received.fetch_add(1, Ordering::Relaxed);

        let Some(operation) = self.exchange.router().resolve(&envelope, &RELAY_ROUTE)? else {
            return Ok(None);
        };

        let rp_id = match envelope.require_id() {
            Ok(id) => id,
            Err(e) => {
                stats.ignored.fetch_add(1, Ordering::Relaxed);
                warn!(operation = %operation, "Chrome event without id cannot be answered");
                return Err(e.into());
            }
        };

        debug!(operation = %operation, rp_id = %rp_id, "Chrome event routed");
        Ok(Some(
            self.exchange.start(operation, ReplyChannel::Relay(rp_id)),
        ))
    }
}
