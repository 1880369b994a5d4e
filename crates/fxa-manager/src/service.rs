//! FxA manager service - owns the router, the management port and the two
//! bus listeners.

use crate::domain::config::ManagerConfig;
use crate::domain::error::{ManagerError, ManagerResult};
use crate::domain::pending::{InFlight, InFlightRequests, RelayStats, StatsSnapshot, Ticket};
use crate::ipc::{ChromeEventRelay, Exchange, PortGateway, ReplyEmitter};
use crate::ports::inbound::{AccountManagerApi, ReplyHandle};
use crate::ports::outbound::PortConnector;
use crate::router::{Collaborators, Router};
use parking_lot::Mutex;
use shared_bus::{EventBus, EventFilter, EventTopic, Subscription, SystemEvent};
use shared_types::Envelope;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Account manager context.
///
/// Replaces the process-wide dispatch table and port singleton: everything
/// the two channels share lives here and is built once.
pub struct FxAccountsManager {
    config: ManagerConfig,
    gateway: Arc<PortGateway>,
    relay: Arc<ChromeEventRelay>,
    bus: Arc<dyn EventBus>,
    emitter: Arc<ReplyEmitter>,
    in_flight: Arc<InFlightRequests>,
    stats: Arc<RelayStats>,
    runtime: Handle,
    listeners: Mutex<Vec<JoinHandle<()>>>,
}

impl FxAccountsManager {
    /// Create a manager on the current tokio runtime. Listeners are not
    /// registered until `start`.
    ///
    /// Fails with `ManagerError::NoRuntime` outside a runtime.
    pub fn new(
        config: ManagerConfig,
        collaborators: Collaborators,
        connector: Arc<dyn PortConnector>,
        bus: Arc<dyn EventBus>,
    ) -> ManagerResult<Self> {
        let runtime = Handle::try_current().map_err(|_| ManagerError::NoRuntime)?;
        Self::with_runtime(config, collaborators, connector, bus, runtime)
    }

    /// Create a manager whose listeners and reply tasks run on `runtime`.
    pub fn with_runtime(
        config: ManagerConfig,
        collaborators: Collaborators,
        connector: Arc<dyn PortConnector>,
        bus: Arc<dyn EventBus>,
        runtime: Handle,
    ) -> ManagerResult<Self> {
        config.validate()?;

        let stats = Arc::new(RelayStats::default());
        let in_flight = Arc::new(InFlightRequests::new());
        let router = Arc::new(Router::new(
            collaborators,
            config.unknown_operation,
            stats.clone(),
        ));
        let emitter = Arc::new(ReplyEmitter::new(
            connector,
            config.port_name.clone(),
            bus.clone(),
        ));
        let exchange = Exchange::new(
            router,
            emitter.clone(),
            in_flight.clone(),
            stats.clone(),
            runtime.clone(),
        );

        Ok(Self {
            gateway: Arc::new(PortGateway::new(exchange.clone())),
            relay: Arc::new(ChromeEventRelay::new(exchange)),
            config,
            bus,
            emitter,
            in_flight,
            stats,
            runtime,
            listeners: Mutex::new(Vec::new()),
        })
    }

    /// Register one port-message listener and one chrome-event listener.
    pub fn start(&self) -> ManagerResult<()> {
        let mut listeners = self.listeners.lock();
        if !listeners.is_empty() {
            warn!("Listeners already registered");
            return Err(ManagerError::AlreadyStarted);
        }

        let port_events = self.bus.subscribe(self.port_filter());
        let chrome_events = self.bus.subscribe(Self::chrome_filter());

        listeners.push(
            self.runtime
                .spawn(port_listener(port_events, self.gateway.clone())),
        );
        listeners.push(
            self.runtime
                .spawn(chrome_listener(chrome_events, self.relay.clone())),
        );

        info!(
            port = %self.config.port_name,
            policy = %self.config.unknown_operation,
            "FxA manager listening"
        );
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        !self.listeners.lock().is_empty()
    }

    /// Listeners currently registered on the bus for the two inbound channels.
    pub fn listener_count(&self) -> usize {
        self.bus.subscriptions_for(&self.port_filter())
            + self.bus.subscriptions_for(&Self::chrome_filter())
    }

    fn port_filter(&self) -> EventFilter {
        EventFilter::iac(self.config.port_name.clone())
    }

    fn chrome_filter() -> EventFilter {
        EventFilter::topics(vec![EventTopic::RpChrome])
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of requests still waiting on a collaborator.
    pub fn in_flight(&self) -> usize {
        self.in_flight.pending_count()
    }

    /// Requests waiting longer than `age`. Nothing times out on its own, so
    /// this is the only way a hung collaborator shows up.
    pub fn stale(&self, age: Duration) -> Vec<(Ticket, InFlight)> {
        self.in_flight.stale(age)
    }

    pub fn has_port(&self) -> bool {
        self.emitter.has_port()
    }
}

impl AccountManagerApi for FxAccountsManager {
    fn on_port_message(&self, envelope: Envelope) -> ManagerResult<Option<ReplyHandle>> {
        self.gateway.on_port_message(envelope)
    }

    fn handle_event(&self, envelope: Envelope) -> ManagerResult<Option<ReplyHandle>> {
        self.relay.handle_event(envelope)
    }
}

impl Drop for FxAccountsManager {
    fn drop(&mut self) {
        for listener in self.listeners.get_mut().drain(..) {
            listener.abort();
        }
    }
}

async fn port_listener(mut events: Subscription, gateway: Arc<PortGateway>) {
    while let Some(event) = events.recv().await {
        let SystemEvent::IacMessage { detail, .. } = event else {
            continue;
        };
        if let Err(e) = gateway.on_port_message(detail) {
            debug!(error = %e, "Port message not routed");
        }
    }
    debug!("Port listener stopped");
}

async fn chrome_listener(mut events: Subscription, relay: Arc<ChromeEventRelay>) {
    while let Some(event) = events.recv().await {
        let SystemEvent::RpChrome(detail) = event else {
            continue;
        };
        if let Err(e) = relay.handle_event(detail) {
            debug!(error = %e, "Chrome event not routed");
        }
    }
    debug!("Chrome listener stopped");
}
