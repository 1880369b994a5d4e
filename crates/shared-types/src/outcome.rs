//! # Outcome
//!
//! Normalized result of a collaborator invocation.

/// Opaque collaborator value. Never inspected, only forwarded.
pub type Payload = serde_json::Value;

/// Tagged result of a single collaborator call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The collaborator called its success continuation.
    Success(Payload),
    /// The collaborator called its error continuation.
    Failure(Payload),
}

impl Outcome {
    pub fn success(payload: impl Into<Payload>) -> Self {
        Outcome::Success(payload.into())
    }

    pub fn failure(reason: impl Into<Payload>) -> Self {
        Outcome::Failure(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The carried value regardless of tag.
    pub fn payload(&self) -> &Payload {
        match self {
            Outcome::Success(p) | Outcome::Failure(p) => p,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::Failure(_) => "failure",
        }
    }
}

impl From<Result<Payload, Payload>> for Outcome {
    fn from(result: Result<Payload, Payload>) -> Self {
        match result {
            Ok(p) => Outcome::Success(p),
            Err(p) => Outcome::Failure(p),
        }
    }
}

impl From<Outcome> for Result<Payload, Payload> {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success(p) => Ok(p),
            Outcome::Failure(p) => Err(p),
        }
    }
}
