// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! FxA Manager - account management relay between the `fxa-mgmt` port, the
//! RP chrome channel and the account collaborators.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          FxAccountsManager                           │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐                    ┌──────────────────────┐    │
//! │  │   PortGateway    │                    │   ChromeEventRelay   │    │
//! │  │  iac-fxa-mgmt    │                    │ RPChromeEvent (id)   │    │
//! │  └────────┬─────────┘                    └──────────┬───────────┘    │
//! │           │                                         │                │
//! │  ┌────────┴─────────────────────────────────────────┴───────────┐    │
//! │  │                    Router + Continuation                     │    │
//! │  │   getAccounts/logout → AccountClient   openFlow → LoginUi    │    │
//! │  └────────────────────────────┬─────────────────────────────────┘    │
//! │                               │ Outcome                              │
//! │  ┌────────────────────────────┴─────────────────────────────────┐    │
//! │  │              format_reply → ReplyEmitter                     │    │
//! │  │   {data|error} on the port     {id, data|error} on content   │    │
//! │  └──────────────────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - One reply per routed envelope; a collaborator settling twice is ignored
//!   after the first settlement.
//! - Replies are emitted from a spawned task, never from inside the call that
//!   received the envelope.
//! - Relay replies echo the inbound id.
//! - Unknown operations reach no collaborator; the configured
//!   `UnknownOperationPolicy` decides whether that is silent or an error.
//!
//! # Usage
//!
//! ```ignore
//! use fxa_manager::{Collaborators, FxAccountsManager, ManagerConfig};
//!
//! let config = ManagerConfig::from_env();
//! let bus = Arc::new(config.event_bus());
//! let manager = FxAccountsManager::new(config, Collaborators::new(client, ui), connector, bus)?;
//! manager.start()?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod domain;
pub mod ipc;
pub mod ports;
pub mod router;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports for public API
pub use domain::config::{ManagerConfig, UnknownOperationPolicy};
pub use domain::error::{ConfigError, LoadError, ManagerError, ManagerResult, PortError};
pub use domain::pending::{InFlight, Resolution, StatsSnapshot, Ticket};
pub use ports::{
    AccountClient, AccountManagerApi, DeferredLoader, LoginUi, MessagePort, PortConnector,
    ReadyLoader, ReplyHandle,
};
pub use router::continuation::{Continuation, Settlement};
pub use router::{
    ChannelRoute, Collaborators, PORT_OPERATIONS, PORT_ROUTE, RELAY_OPERATIONS, RELAY_ROUTE,
};
pub use service::FxAccountsManager;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
