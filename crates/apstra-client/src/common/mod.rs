//! Common utilities for the Apstra API client
//!
//! Provides the authenticated HTTP wrapper shared by all API operations.

use crate::error::ApstraError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::RwLock;
use tracing::debug;

/// Header carrying the session token issued by `/api/aaa/login`
pub const AUTH_TOKEN_HEADER: &str = "AuthToken";

/// HTTP client wrapper with token authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Store the session token used by subsequent requests
    pub async fn set_token(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, ApstraError> {
        let token = self.token.read().await;
        let token = token.as_deref().ok_or_else(|| {
            ApstraError::Authentication("client is not logged in".to_string())
        })?;
        Ok(builder
            .header(AUTH_TOKEN_HEADER, token)
            .header("Accept", "application/json"))
    }

    /// Make an unauthenticated POST request (used for login)
    pub async fn post_anonymous<B: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApstraError> {
        let url = self.build_url(path);
        debug!("POST {} (anonymous)", url);

        let response = self.client
            .post(&url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        let response = Self::check("POST", path, response).await?;
        Ok(response.json().await?)
    }

    /// Make a GET request
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ApstraError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let response = self.authorized(self.client.get(&url)).await?
            .send()
            .await?;

        let response = Self::check("GET", path, response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApstraError::Api(format!(
                "error decoding response body: {} - Response (first 500 chars): {}",
                e,
                text.chars().take(500).collect::<String>()
            ))
        })
    }

    /// Make a POST request
    pub async fn post<B: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApstraError> {
        let url = self.build_url(path);
        debug!("POST {}", url);

        let response = self.authorized(self.client.post(&url)).await?
            .json(body)
            .send()
            .await?;

        let response = Self::check("POST", path, response).await?;
        Ok(response.json().await?)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), ApstraError> {
        let url = self.build_url(path);
        debug!("DELETE {}", url);

        let response = self.authorized(self.client.delete(&url)).await?
            .send()
            .await?;

        Self::check("DELETE", path, response).await?;
        Ok(())
    }

    /// Map non-success statuses onto `ApstraError`
    async fn check(method: &str, path: &str, response: Response) -> Result<Response, ApstraError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = format!("{} {} failed: {} - {}", method, path, status, body);
        Err(status_error(status, detail))
    }
}

fn status_error(status: StatusCode, detail: String) -> ApstraError {
    match status {
        StatusCode::NOT_FOUND => ApstraError::NotFound(detail),
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => ApstraError::Conflict(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApstraError::Authentication(detail),
        StatusCode::BAD_REQUEST => ApstraError::InvalidRequest(detail),
        _ => ApstraError::Api(detail),
    }
}
