//! Apstra API client
//!
//! Implements the subset of the Apstra REST API used for blueprint locking:
//! `/api/aaa/login`, `/api/blueprints/{id}` and `/api/design/tags`.

use crate::apstra_trait::ApstraClientTrait;
use crate::common::HttpClient;
use crate::error::ApstraError;
use crate::models::{Blueprint, LoginRequest, LoginResponse, ObjectId, Tag, TagList, TagRequest};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

const LOGIN_PATH: &str = "/api/aaa/login";
const TAGS_PATH: &str = "/api/design/tags";

/// Apstra API client
pub struct ApstraClient {
    http: HttpClient,
    username: String,
    password: String,
}

impl fmt::Debug for ApstraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApstraClient")
            .field("base_url", &self.http.base_url())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl ApstraClient {
    /// Create a new Apstra client
    ///
    /// # Arguments
    /// * `base_url` - Apstra base URL without credentials (e.g., "https://apstra:443")
    /// * `username` / `password` - credentials used by [`ApstraClient::login`]
    /// * `tls_validation_disabled` - accept self-signed or otherwise invalid certificates
    pub fn new(
        base_url: String,
        username: String,
        password: String,
        tls_validation_disabled: bool,
    ) -> Result<Self, ApstraError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(tls_validation_disabled)
            .build()?;

        Ok(Self {
            http: HttpClient::new(client, base_url),
            username,
            password,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Log in and keep the session token.
    ///
    /// Logging in once up front keeps parallel workflows from each
    /// authenticating and tripping the API's request rate limit.
    pub async fn login(&self) -> Result<(), ApstraError> {
        debug!("Logging in to Apstra as {}", self.username);

        let request = LoginRequest {
            username: self.username.clone(),
            password: self.password.clone(),
        };
        let response: LoginResponse = self.http.post_anonymous(LOGIN_PATH, &request).await?;
        if response.token.is_empty() {
            return Err(ApstraError::Authentication("login returned an empty token".to_string()));
        }

        self.http.set_token(response.token).await;
        info!("Logged in to Apstra at {}", self.http.base_url());
        Ok(())
    }

    /// Check whether a blueprint exists
    ///
    /// # Returns
    /// * `Ok(true)` / `Ok(false)` - blueprint found / API returned 404
    /// * `Err(ApstraError)` - any other failure
    pub async fn blueprint_exists(&self, blueprint_id: &str) -> Result<bool, ApstraError> {
        let path = format!("/api/blueprints/{}", blueprint_id);
        match self.http.get::<Blueprint>(&path).await {
            Ok(blueprint) => {
                debug!("Found blueprint {} ({})", blueprint.id, blueprint.label);
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List all design tags
    pub async fn list_tags(&self) -> Result<Vec<Tag>, ApstraError> {
        let list: TagList = self.http.get(TAGS_PATH).await?;
        Ok(list.items)
    }

    /// Find a design tag by its label
    pub async fn get_tag_by_label(&self, label: &str) -> Result<Option<Tag>, ApstraError> {
        Ok(self.list_tags().await?.into_iter().find(|t| t.label == label))
    }

    /// Create a design tag and return its ID
    ///
    /// Tag labels are unique, so a second create with the same label fails with
    /// `ApstraError::Conflict`.
    pub async fn create_tag(&self, request: &TagRequest) -> Result<String, ApstraError> {
        if request.label.is_empty() {
            return Err(ApstraError::InvalidRequest("tag label must not be empty".to_string()));
        }

        debug!("Creating tag {}", request.label);
        let created: ObjectId = self.http.post(TAGS_PATH, request).await?;
        Ok(created.id)
    }

    /// Delete a design tag by ID
    pub async fn delete_tag(&self, id: &str) -> Result<(), ApstraError> {
        debug!("Deleting tag {}", id);
        self.http.delete(&format!("{}/{}", TAGS_PATH, id)).await
    }
}

#[async_trait::async_trait]
impl ApstraClientTrait for ApstraClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn login(&self) -> Result<(), ApstraError> {
        self.login().await
    }

    async fn blueprint_exists(&self, blueprint_id: &str) -> Result<bool, ApstraError> {
        self.blueprint_exists(blueprint_id).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, ApstraError> {
        self.list_tags().await
    }

    async fn get_tag_by_label(&self, label: &str) -> Result<Option<Tag>, ApstraError> {
        self.get_tag_by_label(label).await
    }

    async fn create_tag(&self, request: &TagRequest) -> Result<String, ApstraError> {
        self.create_tag(request).await
    }

    async fn delete_tag(&self, id: &str) -> Result<(), ApstraError> {
        self.delete_tag(id).await
    }
}
