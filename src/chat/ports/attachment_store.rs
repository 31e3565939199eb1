//! External blob storage for message attachments.

use crate::chat::domain::Attachment;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Removes stored attachment files.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Deletes the stored object behind `attachment`.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentStoreError`] when the store rejects the removal.
    async fn remove(&self, attachment: &Attachment) -> Result<(), AttachmentStoreError>;
}

/// Errors returned by attachment stores.
#[derive(Debug, Clone, Error)]
pub enum AttachmentStoreError {
    /// The object does not exist.
    #[error("attachment not found: {0}")]
    NotFound(String),

    /// Storage-layer failure.
    #[error("storage error: {0}")]
    Storage(Arc<dyn std::error::Error + Send + Sync>),
}

impl AttachmentStoreError {
    /// Wraps a storage error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Arc::new(err))
    }
}
