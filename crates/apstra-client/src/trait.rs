//! ApstraClient trait for mocking
//!
//! This trait abstracts the ApstraClient to enable mocking in unit tests.
//! The concrete ApstraClient implements this trait, and tests can use mock implementations.

use crate::error::ApstraError;
use crate::models::{Tag, TagRequest};

/// Trait for Apstra API client operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ApstraClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Authenticate and keep the session token for later calls
    async fn login(&self) -> Result<(), ApstraError>;

    /// Whether a blueprint with this ID exists
    async fn blueprint_exists(&self, blueprint_id: &str) -> Result<bool, ApstraError>;

    // Design tag operations
    async fn list_tags(&self) -> Result<Vec<Tag>, ApstraError>;
    async fn get_tag_by_label(&self, label: &str) -> Result<Option<Tag>, ApstraError>;
    /// Create a tag, failing with `ApstraError::Conflict` when the label is taken
    async fn create_tag(&self, request: &TagRequest) -> Result<String, ApstraError>;
    async fn delete_tag(&self, id: &str) -> Result<(), ApstraError>;
}
