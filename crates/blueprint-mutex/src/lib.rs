//! Blueprint Mutex
//!
//! Cooperative, poll-based mutual exclusion for Apstra blueprints. Only one
//! owner at a time may mutate a blueprint's graph; an owner that already
//! holds the lock is let through again instead of waiting on itself.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use apstra_client::ApstraClient;
//! use blueprint_mutex::BlueprintLocker;
//! use tokio::time::Instant;
//! use tokio_util::sync::CancellationToken;
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
//! let locker = BlueprintLocker::new(Arc::new(client), true);
//! let deadline = Instant::now() + Duration::from_secs(300);
//! locker.lock_blueprint("f5c3f8c2-3d0a-4d3e-9a55-8d3b0c1f0e11", &CancellationToken::new(), Some(deadline)).await?;
//!
//! // ... mutate the blueprint ...
//!
//! locker.release_all().await;
//! # Ok(())
//! # }
//! ```

pub mod blueprint_mutex;
pub mod error;
pub mod handle;
pub mod lock;
pub mod locker;
pub mod message;

pub use blueprint_mutex::{BlueprintMutex, MUTEX_TAG_PREFIX};
pub use error::MutexError;
pub use handle::{MutexHandle, TryLock};
pub use lock::{RETRY_INTERVAL, lock};
pub use locker::BlueprintLocker;
pub use message::{DEFAULT_DETAILS, LockMessage};
