//! Blueprint mutex errors

use apstra_client::ApstraError;
use thiserror::Error;

/// Errors returned while locking or unlocking a blueprint.
///
/// Any error from a lock attempt means the lock is not held.
#[derive(Debug, Error)]
pub enum MutexError {
    /// The API failed while trying to take the lock
    #[error("error locking blueprint mutex: {0}")]
    Lock(#[source] ApstraError),

    /// The API failed while releasing or inspecting the lock
    #[error("error unlocking blueprint mutex: {0}")]
    Unlock(#[source] ApstraError),

    /// The caller's cancellation token fired before the lock was taken
    #[error("blueprint mutex wait cancelled")]
    Cancelled,

    /// The caller's deadline passed before the lock was taken
    #[error("deadline exceeded waiting for blueprint mutex")]
    DeadlineExceeded,

    /// The lock message could not be encoded
    #[error("error encoding blueprint mutex message: {0}")]
    Encode(#[from] serde_json::Error),

    /// Blueprint does not exist
    #[error("blueprint {0} not found")]
    BlueprintNotFound(String),

    /// The lock is held by someone else
    #[error("blueprint mutex is held by another owner: {0}")]
    NotOwner(String),
}
