//! Manager configuration with validation.

use crate::domain::error::ConfigError;
use serde::{Deserialize, Serialize};
use shared_bus::{InMemoryEventBus, DEFAULT_CHANNEL_CAPACITY};
use shared_types::FXA_MGMT_PORT;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// What to do with an envelope whose operation is not routable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownOperationPolicy {
    /// Drop it silently: no reply, no collaborator call.
    #[default]
    Ignore,
    /// Drop it and return `ManagerError::UnknownOperation` to the caller.
    Error,
}

impl FromStr for UnknownOperationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "error" => Ok(Self::Error),
            other => Err(ConfigError::InvalidPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for UnknownOperationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => f.write_str("ignore"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Main manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Inter-app port keyword requests arrive on and replies go to
    pub port_name: String,
    /// Handling of names outside the operation set
    pub unknown_operation: UnknownOperationPolicy,
    /// Buffer size of an in-memory bus built from this config
    pub bus_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            port_name: FXA_MGMT_PORT.to_string(),
            unknown_operation: UnknownOperationPolicy::Ignore,
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ManagerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port_name.trim().is_empty() {
            return Err(ConfigError::EmptyPortName);
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    /// Defaults overridden from `FXA_PORT_NAME`, `FXA_UNKNOWN_OPERATION` and
    /// `FXA_BUS_CAPACITY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`.
    ///
    /// Unparseable values are logged and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup("FXA_PORT_NAME") {
            info!(port_name = %name, "Loaded port name from environment");
            config.port_name = name;
        }

        if let Some(policy) = lookup("FXA_UNKNOWN_OPERATION") {
            match policy.parse() {
                Ok(p) => config.unknown_operation = p,
                Err(e) => warn!(error = %e, "Ignoring FXA_UNKNOWN_OPERATION"),
            }
        }

        if let Some(capacity) = lookup("FXA_BUS_CAPACITY") {
            match capacity.parse() {
                Ok(c) => config.bus_capacity = c,
                Err(_) => warn!(value = %capacity, "FXA_BUS_CAPACITY must be a positive integer"),
            }
        }

        config
    }

    /// Build an in-memory bus sized by `bus_capacity`.
    pub fn event_bus(&self) -> InMemoryEventBus {
        InMemoryEventBus::with_capacity(self.bus_capacity)
    }
}
