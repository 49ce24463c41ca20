//! Mock ApstraClient for unit testing
//!
//! This module provides a mock implementation of ApstraClientTrait that can be used
//! in unit tests without requiring a running Apstra instance.

use crate::apstra_trait::ApstraClientTrait;
use crate::error::ApstraError;
use crate::models::{Tag, TagRequest};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Mock ApstraClient for testing
///
/// Stores tags and blueprints in memory. Tag labels are unique, like the real
/// API, so concurrent `create_tag` calls behave as an atomic try-lock.
#[derive(Debug, Clone)]
pub struct MockApstraClient {
    base_url: String,
    tags: Arc<Mutex<HashMap<String, Tag>>>,
    blueprints: Arc<Mutex<HashSet<String>>>,
    next_id: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockApstraClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tags: Arc::new(Mutex::new(HashMap::new())),
            blueprints: Arc::new(Mutex::new(HashSet::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            failing: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a blueprint to the mock store (for test setup)
    pub async fn add_blueprint(&self, id: impl Into<String>) {
        self.blueprints.lock().await.insert(id.into());
    }

    /// Insert a tag directly, bypassing label checks (for test setup)
    pub async fn add_tag(&self, label: impl Into<String>, description: impl Into<String>) -> String {
        let id = self.next_id();
        let tag = Tag {
            id: id.clone(),
            label: label.into(),
            description: Some(description.into()),
            created_at: Some(chrono::Utc::now()),
            last_modified_at: Some(chrono::Utc::now()),
        };
        self.tags.lock().await.insert(id.clone(), tag);
        id
    }

    /// Make every subsequent call fail with an API error (or stop failing)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of API calls made against this mock
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> String {
        format!("tag-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn record_call(&self) -> Result<(), ApstraError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApstraError::Api("simulated API failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ApstraClientTrait for MockApstraClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn login(&self) -> Result<(), ApstraError> {
        self.record_call()
    }

    async fn blueprint_exists(&self, blueprint_id: &str) -> Result<bool, ApstraError> {
        self.record_call()?;
        Ok(self.blueprints.lock().await.contains(blueprint_id))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, ApstraError> {
        self.record_call()?;
        Ok(self.tags.lock().await.values().cloned().collect())
    }

    async fn get_tag_by_label(&self, label: &str) -> Result<Option<Tag>, ApstraError> {
        self.record_call()?;
        Ok(self.tags.lock().await.values().find(|t| t.label == label).cloned())
    }

    async fn create_tag(&self, request: &TagRequest) -> Result<String, ApstraError> {
        self.record_call()?;
        let mut tags = self.tags.lock().await;
        if tags.values().any(|t| t.label == request.label) {
            return Err(ApstraError::Conflict(format!("tag {} already exists", request.label)));
        }

        let id = self.next_id();
        tags.insert(
            id.clone(),
            Tag {
                id: id.clone(),
                label: request.label.clone(),
                description: Some(request.description.clone()),
                created_at: Some(chrono::Utc::now()),
                last_modified_at: Some(chrono::Utc::now()),
            },
        );
        Ok(id)
    }

    async fn delete_tag(&self, id: &str) -> Result<(), ApstraError> {
        self.record_call()?;
        self.tags
            .lock()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ApstraError::NotFound(format!("Tag {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_tag_enforces_unique_label() {
        let client = MockApstraClient::new("http://test-apstra");
        let request = TagRequest { label: "lock".to_string(), description: "one".to_string() };

        let id = client.create_tag(&request).await.unwrap();
        let again = client.create_tag(&request).await;
        assert!(matches!(again, Err(ApstraError::Conflict(_))));

        let tag = client.get_tag_by_label("lock").await.unwrap().unwrap();
        assert_eq!(tag.id, id);
        assert_eq!(tag.description.as_deref(), Some("one"));

        client.delete_tag(&id).await.unwrap();
        assert!(client.get_tag_by_label("lock").await.unwrap().is_none());
        assert!(client.delete_tag(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let client = MockApstraClient::new("http://test-apstra");
        client.add_blueprint("bp1").await;
        assert!(client.blueprint_exists("bp1").await.unwrap());
        assert!(!client.blueprint_exists("bp2").await.unwrap());

        client.set_failing(true);
        assert!(matches!(client.list_tags().await, Err(ApstraError::Api(_))));
        assert_eq!(client.call_count(), 3);
    }
}
