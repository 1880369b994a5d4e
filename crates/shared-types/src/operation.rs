//! # Operations
//!
//! The closed set of account-management operations and the collaborator each
//! one is bound to.

use crate::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An account-management operation exposed over the port and relay channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Fetch the current account list.
    GetAccounts,
    /// Terminate the current session.
    Logout,
    /// Start the interactive login flow.
    OpenFlow,
}

/// The external capability an operation is delegated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collaborator {
    /// Account-service client (network operations).
    AccountClient,
    /// Interactive login UI.
    LoginUi,
}

impl Operation {
    /// Every supported operation.
    pub const ALL: [Operation; 3] = [Operation::GetAccounts, Operation::Logout, Operation::OpenFlow];

    /// Wire name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetAccounts => "getAccounts",
            Operation::Logout => "logout",
            Operation::OpenFlow => "openFlow",
        }
    }

    /// Look up an operation by its wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// The collaborator that performs this operation.
    pub fn collaborator(&self) -> Collaborator {
        match self {
            Operation::GetAccounts | Operation::Logout => Collaborator::AccountClient,
            Operation::OpenFlow => Collaborator::LoginUi,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| EnvelopeError::UnknownOperation(s.to_string()))
    }
}

impl Collaborator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collaborator::AccountClient => "account-client",
            Collaborator::LoginUi => "login-ui",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
