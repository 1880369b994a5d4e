//! # Shared Types Crate
//!
//! Wire and domain types for the FxA management relay.
//!
//! ## Design Principles
//!
//! - **Opaque Payloads**: Collaborator results are carried as
//!   `serde_json::Value` and only their success/failure tag is ever inspected.
//! - **Closed Operation Set**: `Operation` is a fixed enum; names outside it
//!   never reach a collaborator.
//! - **Two Reply Shapes**: `PortReply` for the `fxa-mgmt` port and
//!   `ContentReply` for the RP content event, both produced by `format_reply`.

pub mod envelope;
pub mod errors;
pub mod operation;
pub mod outcome;
pub mod reply;

pub use envelope::{Envelope, OperationField, RpId};
pub use errors::EnvelopeError;
pub use operation::{Collaborator, Operation};
pub use outcome::{Outcome, Payload};
pub use reply::{format_reply, ContentReply, PortReply, ReplyChannel, WireReply};

/// Name of the inter-app port used for account management requests.
pub const FXA_MGMT_PORT: &str = "fxa-mgmt";
