//! Hexagonal ports for the account manager.

pub mod inbound;
pub mod outbound;

pub use inbound::{AccountManagerApi, ReplyHandle};
pub use outbound::{
    AccountClient, DeferredLoader, LoginUi, MessagePort, PortConnector, ReadyLoader,
};
