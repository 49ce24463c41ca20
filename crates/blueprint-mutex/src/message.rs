//! Lock message
//!
//! The remote lock stores an opaque string. Cooperating clients write a
//! JSON-encoded [`LockMessage`] there so a later attempt can tell whether the
//! current holder is itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Details written by default when a locker generates its own identity
pub const DEFAULT_DETAILS: &str = "locked by terraform";

/// Identity of a lock holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMessage {
    pub owner: String,
    #[serde(default)]
    pub details: String,
}

impl LockMessage {
    /// Create a message for the given owner
    pub fn new(owner: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            details: details.into(),
        }
    }

    /// Fresh random owner with [`DEFAULT_DETAILS`]
    #[must_use]
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string(), DEFAULT_DETAILS)
    }

    /// Encode as the JSON blob stored in the remote lock
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a remote lock's message
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// True only when both strings decode and name the same owner.
    ///
    /// Anything that fails to decode is treated as a different owner.
    #[must_use]
    pub fn same_owner(a: &str, b: &str) -> bool {
        match (Self::decode(a), Self::decode(b)) {
            (Ok(a), Ok(b)) => a.owner == b.owner,
            _ => false,
        }
    }
}
