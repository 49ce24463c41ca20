//! Apstra API models
//!
//! Only the objects needed to implement blueprint mutexes are modelled:
//! authentication, global catalog (design) tags and blueprint summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/aaa/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response of `POST /api/aaa/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: String,
}

/// Response carrying only the ID of a newly created object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectId {
    pub id: String,
}

/// Design (global catalog) tag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/design/tags`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRequest {
    pub label: String,
    pub description: String,
}

/// Response of `GET /api/design/tags`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagList {
    pub items: Vec<Tag>,
}

/// Blueprint summary as returned by `GET /api/blueprints/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_deserializes_without_optional_fields() {
        let tag: Tag = serde_json::from_str(r#"{"id":"abc","label":"blueprint-mutex-bp1"}"#).unwrap();
        assert_eq!(tag.id, "abc");
        assert_eq!(tag.label, "blueprint-mutex-bp1");
        assert!(tag.description.is_none());
        assert!(tag.created_at.is_none());
    }

    #[test]
    fn test_tag_list_with_timestamps() {
        let body = r#"{"items":[{
            "id":"t1",
            "label":"spine",
            "description":"fabric spines",
            "created_at":"2024-03-01T12:00:00Z",
            "last_modified_at":"2024-03-02T08:30:00Z"
        }]}"#;
        let list: TagList = serde_json::from_str(body).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].description.as_deref(), Some("fabric spines"));
        assert!(list.items[0].last_modified_at > list.items[0].created_at);
    }
}
