//! Apstra REST API Client
//!
//! A Rust client library for the parts of the Apstra REST API needed to
//! coordinate exclusive access to blueprints: login, design tags and
//! blueprint lookups.
//!
//! # Example
//!
//! ```no_run
//! use apstra_client::{ApstraClient, TagRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApstraClient::new(
//!     "https://apstra.example.com".to_string(),
//!     "admin".to_string(),
//!     "admin".to_string(),
//!     false,
//! )?;
//! client.login().await?;
//!
//! let id = client
//!     .create_tag(&TagRequest {
//!         label: "maintenance".to_string(),
//!         description: "spine upgrade".to_string(),
//!     })
//!     .await?;
//! client.delete_tag(&id).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod apstra_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use apstra_trait::ApstraClientTrait;
pub use client::ApstraClient;
pub use common::HttpClient;
pub use error::ApstraError;
pub use models::*;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockApstraClient;
