//! Operation router.
//!
//! Maps an envelope to exactly one collaborator call and waits for its
//! outcome. Shared by the port gateway and the chrome relay.
//!
//! | Operation     | Collaborator    | Call                        |
//! |---------------|-----------------|-----------------------------|
//! | `getAccounts` | `AccountClient` | `get_accounts(continuation)`|
//! | `logout`      | `AccountClient` | `logout(continuation)`      |
//! | `openFlow`    | `LoginUi`       | `login(continuation)`       |

pub mod continuation;

use crate::domain::config::UnknownOperationPolicy;
use crate::domain::error::{LoadError, ManagerError, ManagerResult};
use crate::domain::pending::RelayStats;
use crate::ports::outbound::{AccountClient, DeferredLoader, LoginUi, ReadyLoader};
use continuation::Continuation;
use shared_types::{Envelope, EnvelopeError, Operation, OperationField, Outcome};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Operations accepted on the `fxa-mgmt` port.
pub const PORT_OPERATIONS: &[Operation] = &Operation::ALL;

/// Operations accepted on the RP chrome channel.
pub const RELAY_OPERATIONS: &[Operation] = &[Operation::OpenFlow];

/// How one inbound channel names its operations and which it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRoute {
    pub channel: &'static str,
    pub field: OperationField,
    pub wired: &'static [Operation],
}

/// `{name}` on the `fxa-mgmt` port, every operation wired.
pub const PORT_ROUTE: ChannelRoute = ChannelRoute {
    channel: "port",
    field: OperationField::Name,
    wired: PORT_OPERATIONS,
};

/// `{id, method}` on the RP chrome channel, `openFlow` only.
pub const RELAY_ROUTE: ChannelRoute = ChannelRoute {
    channel: "relay",
    field: OperationField::Method,
    wired: RELAY_OPERATIONS,
};

/// The external capabilities operations are delegated to.
#[derive(Clone)]
pub struct Collaborators {
    pub accounts: Arc<dyn AccountClient>,
    pub ui: Arc<dyn LoginUi>,
    pub loader: Arc<dyn DeferredLoader>,
}

impl Collaborators {
    /// Collaborators that need no deferred loading.
    pub fn new(accounts: Arc<dyn AccountClient>, ui: Arc<dyn LoginUi>) -> Self {
        Self {
            accounts,
            ui,
            loader: Arc::new(ReadyLoader),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn DeferredLoader>) -> Self {
        self.loader = loader;
        self
    }
}

/// Dispatch table from operations to collaborator calls.
pub struct Router {
    collaborators: Collaborators,
    ready: OnceCell<()>,
    policy: UnknownOperationPolicy,
    stats: Arc<RelayStats>,
}

impl Router {
    pub fn new(
        collaborators: Collaborators,
        policy: UnknownOperationPolicy,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            collaborators,
            ready: OnceCell::new(),
            policy,
            stats,
        }
    }

    /// Resolve the operation an envelope asks for on `route`.
    ///
    /// Only `route.field` is read. Names outside `route.wired`, and a missing
    /// name, go to the unknown-operation policy: `Ok(None)` to ignore,
    /// `Err(UnknownOperation)` to report.
    pub fn resolve(
        &self,
        envelope: &Envelope,
        route: &ChannelRoute,
    ) -> ManagerResult<Option<Operation>> {
        match envelope.operation(route.field) {
            Ok(operation) if route.wired.contains(&operation) => Ok(Some(operation)),
            Ok(_) | Err(EnvelopeError::UnknownOperation(_)) | Err(EnvelopeError::MissingOperation) => {
                let name = envelope.operation_name(route.field).unwrap_or_default();
                self.reject(name, route.channel)
            }
            Err(e) => {
                self.stats.ignored.fetch_add(1, Ordering::Relaxed);
                Err(e.into())
            }
        }
    }

    fn reject(&self, name: &str, channel: &'static str) -> ManagerResult<Option<Operation>> {
        self.stats.ignored.fetch_add(1, Ordering::Relaxed);
        match self.policy {
            UnknownOperationPolicy::Ignore => {
                debug!(name = name, channel = channel, "Ignoring unknown operation");
                Ok(None)
            }
            UnknownOperationPolicy::Error => {
                warn!(name = name, channel = channel, "Rejecting unknown operation");
                Err(ManagerError::UnknownOperation {
                    name: name.to_string(),
                    channel,
                })
            }
        }
    }

    /// Invoke the collaborator bound to `operation` and wait for its outcome.
    ///
    /// A failed deferred load is reported as a failure outcome carrying the
    /// load error text. `None` means the collaborator abandoned the call.
    pub async fn dispatch(&self, operation: Operation) -> Option<Outcome> {
        if let Err(e) = self.ensure_ready().await {
            warn!(operation = %operation, error = %e, "Collaborators not ready");
            return Some(Outcome::failure(e.to_string()));
        }

        let (done, settlement) = Continuation::channel(operation, self.stats.clone());

        debug!(
            operation = %operation,
            collaborator = %operation.collaborator(),
            "Invoking collaborator"
        );

        match operation {
            Operation::GetAccounts => self.collaborators.accounts.get_accounts(done),
            Operation::Logout => self.collaborators.accounts.logout(done),
            Operation::OpenFlow => self.collaborators.ui.login(done),
        }

        settlement.outcome().await
    }

    /// Run the deferred loader once; a failure is retried on the next call.
    async fn ensure_ready(&self) -> Result<(), LoadError> {
        self.ready
            .get_or_try_init(|| self.collaborators.loader.load())
            .await
            .map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    pub fn policy(&self) -> UnknownOperationPolicy {
        self.policy
    }
}
