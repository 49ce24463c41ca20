//! Apstra-backed blueprint mutex
//!
//! The lock for a blueprint is a design tag labelled
//! `blueprint-mutex-<blueprint id>`. Tag labels are unique, so creating the
//! tag is an atomic try-lock and deleting it releases the lock. The tag
//! description carries the holder's [`LockMessage`].

use crate::error::MutexError;
use crate::handle::{MutexHandle, TryLock};
use crate::message::LockMessage;
use apstra_client::{ApstraClientTrait, ApstraError, TagRequest};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Label prefix of the tags used as blueprint locks
pub const MUTEX_TAG_PREFIX: &str = "blueprint-mutex-";

/// Lock on a single blueprint
pub struct BlueprintMutex<C: ApstraClientTrait + ?Sized> {
    client: Arc<C>,
    blueprint_id: String,
    message: String,
}

impl<C: ApstraClientTrait + ?Sized> fmt::Debug for BlueprintMutex<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlueprintMutex")
            .field("blueprint_id", &self.blueprint_id)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl<C: ApstraClientTrait + ?Sized> BlueprintMutex<C> {
    /// Create a mutex handle for `blueprint_id`.
    ///
    /// The handle carries an empty message until [`BlueprintMutex::set_message`] is called.
    pub fn new(client: Arc<C>, blueprint_id: impl Into<String>) -> Self {
        Self {
            client,
            blueprint_id: blueprint_id.into(),
            message: String::new(),
        }
    }

    /// Set the message written into the lock on acquisition
    pub fn set_message(&mut self, message: &LockMessage) -> Result<(), MutexError> {
        self.message = message.encode()?;
        Ok(())
    }

    /// ID of the blueprint this mutex guards
    pub fn blueprint_id(&self) -> &str {
        &self.blueprint_id
    }

    /// Label of the tag backing this mutex
    pub fn label(&self) -> String {
        format!("{}{}", MUTEX_TAG_PREFIX, self.blueprint_id)
    }

    /// Current holder's raw message, `None` when unlocked
    pub async fn holder(&self) -> Result<Option<String>, MutexError> {
        let tag = self.client.get_tag_by_label(&self.label()).await.map_err(MutexError::Unlock)?;
        Ok(tag.map(|t| t.description.unwrap_or_default()))
    }

    /// Release the lock if this handle's owner holds it.
    ///
    /// # Returns
    /// * `Ok(true)` - lock released
    /// * `Ok(false)` - nothing to release
    /// * `Err(MutexError::NotOwner)` - held by someone else; left in place
    pub async fn unlock(&self) -> Result<bool, MutexError> {
        let label = self.label();
        let Some(tag) = self.client.get_tag_by_label(&label).await.map_err(MutexError::Unlock)? else {
            debug!("Blueprint {} mutex already unlocked", self.blueprint_id);
            return Ok(false);
        };

        let holder = tag.description.unwrap_or_default();
        if !LockMessage::same_owner(&holder, &self.message) {
            return Err(MutexError::NotOwner(holder));
        }

        self.delete(&tag.id).await?;
        info!("Blueprint {} mutex released", self.blueprint_id);
        Ok(true)
    }

    /// Release the lock no matter who holds it
    pub async fn clear_unsafely(&self) -> Result<(), MutexError> {
        if let Some(tag) = self.client.get_tag_by_label(&self.label()).await.map_err(MutexError::Unlock)? {
            self.delete(&tag.id).await?;
            info!("Blueprint {} mutex cleared", self.blueprint_id);
        }
        Ok(())
    }

    async fn delete(&self, tag_id: &str) -> Result<(), MutexError> {
        match self.client.delete_tag(tag_id).await {
            Ok(()) => Ok(()),
            // released by someone else in the meantime
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(MutexError::Unlock(e)),
        }
    }
}

#[async_trait::async_trait]
impl<C: ApstraClientTrait + ?Sized> MutexHandle for BlueprintMutex<C> {
    async fn try_lock(&self, force: bool) -> Result<TryLock, ApstraError> {
        let label = self.label();

        if force {
            if let Some(tag) = self.client.get_tag_by_label(&label).await? {
                warn!(
                    "Forcing blueprint {} mutex held by: {}",
                    self.blueprint_id,
                    tag.description.as_deref().unwrap_or_default()
                );
                match self.client.delete_tag(&tag.id).await {
                    Err(e) if !e.is_not_found() => return Err(e),
                    _ => {}
                }
            }
        }

        let request = TagRequest {
            label: label.clone(),
            description: self.message.clone(),
        };
        match self.client.create_tag(&request).await {
            Ok(_) => Ok(TryLock::Acquired),
            Err(ApstraError::Conflict(_)) => {
                let holder = self.client.get_tag_by_label(&label).await?;
                Ok(TryLock::Contended(holder.map(|t| t.description.unwrap_or_default())))
            }
            Err(e) => Err(e),
        }
    }

    fn message(&self) -> &str {
        &self.message
    }
}
