//! Process-wide blueprint locker
//!
//! One [`BlueprintLocker`] is created per process (or per run) and passed to
//! whatever needs exclusive blueprint access. It owns the process's lock
//! identity and remembers which blueprints it has locked so they can be
//! released later, individually or all at once.

use crate::blueprint_mutex::BlueprintMutex;
use crate::error::MutexError;
use crate::lock::lock;
use crate::message::LockMessage;
use apstra_client::ApstraClientTrait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Locks blueprints on behalf of a single owner and tracks what it holds
pub struct BlueprintLocker<C: ApstraClientTrait + ?Sized> {
    client: Arc<C>,
    message: LockMessage,
    enabled: bool,
    held: Mutex<HashMap<String, BlueprintMutex<C>>>,
}

impl<C: ApstraClientTrait + ?Sized> fmt::Debug for BlueprintLocker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlueprintLocker")
            .field("message", &self.message)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl<C: ApstraClientTrait + ?Sized> BlueprintLocker<C> {
    /// Locker with a freshly generated owner identity
    pub fn new(client: Arc<C>, enabled: bool) -> Self {
        Self::with_message(client, LockMessage::generate(), enabled)
    }

    /// Locker writing `message` into every lock it takes
    pub fn with_message(client: Arc<C>, message: LockMessage, enabled: bool) -> Self {
        Self {
            client,
            message,
            enabled,
            held: Mutex::new(HashMap::new()),
        }
    }

    /// Owner identity written into locks
    pub fn owner(&self) -> &str {
        &self.message.owner
    }

    /// Whether locking is enabled; a disabled locker grants every request
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Lock `blueprint_id`, waiting until it is free, `cancel` fires or `deadline` passes
    pub async fn lock_blueprint(
        &self,
        blueprint_id: &str,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<(), MutexError> {
        if !self.enabled {
            debug!("Blueprint mutex disabled, not locking {}", blueprint_id);
            return Ok(());
        }

        if !self.client.blueprint_exists(blueprint_id).await.map_err(MutexError::Lock)? {
            return Err(MutexError::BlueprintNotFound(blueprint_id.to_string()));
        }

        let mut mutex = BlueprintMutex::new(Arc::clone(&self.client), blueprint_id);
        mutex.set_message(&self.message)?;

        lock(&mutex, cancel, deadline).await?;
        info!("Locked blueprint {} as {}", blueprint_id, self.message.owner);

        self.held
            .lock()
            .await
            .entry(blueprint_id.to_string())
            .or_insert(mutex);
        Ok(())
    }

    /// Release a blueprint locked through this locker; unknown IDs are ignored
    pub async fn unlock_blueprint(&self, blueprint_id: &str) -> Result<(), MutexError> {
        let mut held = self.held.lock().await;
        let Some(mutex) = held.get(blueprint_id) else {
            debug!("Blueprint {} not locked by this locker", blueprint_id);
            return Ok(());
        };

        mutex.clear_unsafely().await?;
        held.remove(blueprint_id);
        info!("Unlocked blueprint {}", blueprint_id);
        Ok(())
    }

    /// Release every held blueprint.
    ///
    /// Keeps going past failures; returns the blueprints that could not be
    /// released along with why. Failed entries stay tracked.
    pub async fn release_all(&self) -> Vec<(String, MutexError)> {
        let mut held = self.held.lock().await;
        let mut failures = Vec::new();

        let mut ids: Vec<String> = held.keys().cloned().collect();
        ids.sort();
        for id in ids {
            let result = match held.get(&id) {
                Some(mutex) => mutex.clear_unsafely().await,
                None => continue,
            };
            match result {
                Ok(()) => {
                    held.remove(&id);
                    info!("Unlocked blueprint {}", id);
                }
                Err(e) => {
                    warn!("Failed to unlock blueprint {}: {}", id, e);
                    failures.push((id, e));
                }
            }
        }

        failures
    }

    /// IDs of the blueprints currently held, sorted
    pub async fn held_blueprints(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.held.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
