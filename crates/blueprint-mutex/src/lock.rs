//! # Blueprint lock acquisition
//!
//! Polls a [`MutexHandle`] until the lock is taken, the caller gives up, or
//! the API fails.
//!
//! The first attempt is made immediately; later attempts follow every
//! [`RETRY_INTERVAL`]. Cancellation and the optional deadline are checked
//! before every attempt and win any race against the retry timer.
//!
//! A contended lock whose holder message names the same owner as the
//! handle's own message counts as acquired: the caller already holds it.
//! Messages that do not decode never match.

use crate::error::MutexError;
use crate::handle::{MutexHandle, TryLock};
use crate::message::LockMessage;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Time between try-lock attempts while the lock is contended
pub const RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Block until `handle` is locked.
///
/// # Returns
/// * `Ok(())` - the lock is held, possibly by an earlier acquisition from the same owner
/// * `Err(MutexError::Cancelled)` / `Err(MutexError::DeadlineExceeded)` - gave up waiting
/// * `Err(MutexError::Lock)` - the try-lock call itself failed; never retried
pub async fn lock<M: MutexHandle + ?Sized>(
    handle: &M,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> Result<(), MutexError> {
    let mut ticker = tokio::time::interval(RETRY_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempts: u64 = 0;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(MutexError::Cancelled),
            () = wait_for(deadline) => return Err(MutexError::DeadlineExceeded),
            _ = ticker.tick() => {}
        }

        attempts += 1;
        debug!("Blueprint mutex attempt {}", attempts);

        match handle.try_lock(false).await.map_err(MutexError::Lock)? {
            TryLock::Acquired => {
                info!("Blueprint mutex acquired after {} attempt(s)", attempts);
                return Ok(());
            }
            TryLock::Contended(Some(holder)) if LockMessage::same_owner(&holder, handle.message()) => {
                info!("Blueprint mutex already held by this owner");
                return Ok(());
            }
            TryLock::Contended(holder) => {
                debug!("Blueprint mutex contended, holder: {}", holder.as_deref().unwrap_or("<unknown>"));
            }
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
