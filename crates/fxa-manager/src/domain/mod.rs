//! Domain types for the account manager.
//!
//! Configuration, error handling and in-flight request tracking.

pub mod config;
pub mod error;
pub mod pending;

// Re-exports for convenience
pub use config::{ManagerConfig, UnknownOperationPolicy};
pub use error::{ConfigError, LoadError, ManagerError, ManagerResult, PortError};
pub use pending::{
    InFlight, InFlightRequests, RelayStats, Resolution, StatsSnapshot, Ticket,
};
