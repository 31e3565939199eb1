//! In-memory attachment store.

use crate::chat::{
    domain::Attachment,
    ports::{AttachmentStore, AttachmentStoreError},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Holds attachment metadata keyed by storage key.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttachmentStore {
    objects: Arc<RwLock<HashMap<String, Attachment>>>,
}

impl InMemoryAttachmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an uploaded attachment.
    pub fn put(&self, attachment: Attachment) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(attachment.storage_key.clone(), attachment);
    }

    /// Returns `true` while an object is stored under `storage_key`.
    #[must_use]
    pub fn contains(&self, storage_key: &str) -> bool {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(storage_key)
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn remove(&self, attachment: &Attachment) -> Result<(), AttachmentStoreError> {
        self.objects
            .write()
            .map_err(|err| AttachmentStoreError::storage(std::io::Error::other(err.to_string())))?
            .remove(&attachment.storage_key)
            .map(|_| ())
            .ok_or_else(|| AttachmentStoreError::NotFound(attachment.storage_key.clone()))
    }
}
