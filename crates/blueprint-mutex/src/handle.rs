//! MutexHandle trait
//!
//! The seam between the polling algorithm in [`crate::lock`] and whatever
//! remote object actually implements the lock.

use apstra_client::ApstraError;

/// Outcome of a single try-lock attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryLock {
    /// The lock is now ours
    Acquired,
    /// Someone holds the lock; carries their message when it could be read
    Contended(Option<String>),
}

/// A remote lock that can be attempted without blocking
#[async_trait::async_trait]
pub trait MutexHandle: Send + Sync {
    /// Make one attempt to take the lock.
    ///
    /// With `force` set, any existing holder is evicted first.
    async fn try_lock(&self, force: bool) -> Result<TryLock, ApstraError>;

    /// The message this handle writes when it takes the lock
    fn message(&self) -> &str;
}
