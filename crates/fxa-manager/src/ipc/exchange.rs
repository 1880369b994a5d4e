//! Request/reply pipeline shared by the gateway and the relay.

use crate::domain::pending::{InFlightRequests, RelayStats, Resolution};
use crate::ipc::emitter::ReplyEmitter;
use crate::ports::inbound::ReplyHandle;
use crate::router::Router;
use shared_types::{format_reply, Operation, ReplyChannel};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Routes one resolved operation and emits its single reply.
#[derive(Clone)]
pub struct Exchange {
    router: Arc<Router>,
    emitter: Arc<ReplyEmitter>,
    in_flight: Arc<InFlightRequests>,
    stats: Arc<RelayStats>,
    runtime: Handle,
}

impl Exchange {
    pub fn new(
        router: Arc<Router>,
        emitter: Arc<ReplyEmitter>,
        in_flight: Arc<InFlightRequests>,
        stats: Arc<RelayStats>,
        runtime: Handle,
    ) -> Self {
        Self {
            router,
            emitter,
            in_flight,
            stats,
            runtime,
        }
    }

    /// Start `operation` and reply on `channel` once it settles.
    ///
    /// The reply task runs on the runtime captured at construction, so this
    /// may be called from any thread. The reply is never emitted before this
    /// returns.
    pub fn start(&self, operation: Operation, channel: ReplyChannel) -> ReplyHandle {
        let ticket = self.in_flight.register(operation, channel);
        let exchange = self.clone();

        self.runtime.spawn(async move {
            let resolution = exchange.complete(operation, channel).await;
            exchange.in_flight.finish(ticket, resolution);
        })
    }

    async fn complete(&self, operation: Operation, channel: ReplyChannel) -> Resolution {
        let Some(outcome) = self.router.dispatch(operation).await else {
            self.stats.abandoned.fetch_add(1, Ordering::Relaxed);
            return Resolution::Abandoned;
        };

        let tag = outcome.tag();
        match self.emitter.emit(format_reply(channel, outcome)).await {
            Ok(()) => {
                self.stats.replied.fetch_add(1, Ordering::Relaxed);
                debug!(
                    operation = %operation,
                    channel = channel.as_str(),
                    outcome = tag,
                    "Reply emitted"
                );
                Resolution::Replied
            }
            Err(e) => {
                self.stats.undeliverable.fetch_add(1, Ordering::Relaxed);
                warn!(
                    operation = %operation,
                    channel = channel.as_str(),
                    error = %e,
                    "Reply could not be delivered"
                );
                Resolution::Undeliverable
            }
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn emitter(&self) -> &ReplyEmitter {
        &self.emitter
    }

    pub fn in_flight(&self) -> &InFlightRequests {
        &self.in_flight
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }
}
