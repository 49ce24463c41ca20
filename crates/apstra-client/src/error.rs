//! Apstra client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Apstra API
#[derive(Debug, Error)]
pub enum ApstraError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Apstra API returned an error
    #[error("Apstra API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (bad credentials, missing or expired token)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// An object with the same unique key already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApstraError {
    /// Whether this error is a 404 from the API
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
