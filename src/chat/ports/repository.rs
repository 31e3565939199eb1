//! Repository port for chat messages.

use crate::chat::domain::{ChatMessage, ChatMessageId};
use crate::marketplace::domain::{TaskId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for chat repository operations.
pub type ChatRepositoryResult<T> = Result<T, ChatRepositoryError>;

/// Chat message persistence contract.
#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    /// Stores a new message.
    ///
    /// # Errors
    ///
    /// Returns [`ChatRepositoryError::DuplicateMessage`] when the identifier
    /// already exists.
    async fn store(&self, message: &ChatMessage) -> ChatRepositoryResult<()>;

    /// Finds a message by identifier, including soft-deleted ones.
    async fn find_by_id(&self, id: ChatMessageId) -> ChatRepositoryResult<Option<ChatMessage>>;

    /// Replaces the stored message when its version is still `expected`,
    /// advancing the version.
    ///
    /// Returns the stored copy, or `None` when another write got there
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`ChatRepositoryError::NotFound`] when the message does not
    /// exist.
    async fn update_if(
        &self,
        message: &ChatMessage,
        expected: u64,
    ) -> ChatRepositoryResult<Option<ChatMessage>>;

    /// Returns up to `limit` non-deleted messages of the task created before
    /// `before`, oldest first.
    ///
    /// When more messages match, the most recent ones are returned.
    async fn find_by_task(
        &self,
        task_id: TaskId,
        before: Option<DateTime<Utc>>,
        limit: usize,
    ) -> ChatRepositoryResult<Vec<ChatMessage>>;

    /// Marks every unread message of the task addressed to `reader` as read,
    /// advancing the version of each.
    ///
    /// Returns the identifiers of the messages that changed.
    async fn mark_read(
        &self,
        task_id: TaskId,
        reader: UserId,
        at: DateTime<Utc>,
    ) -> ChatRepositoryResult<Vec<ChatMessageId>>;

    /// Counts unread, non-deleted messages addressed to `user`.
    async fn count_unread(&self, user: UserId) -> ChatRepositoryResult<u32>;
}

/// Errors returned by chat repositories.
#[derive(Debug, Clone, Error)]
pub enum ChatRepositoryError {
    /// A message with the same identifier already exists.
    #[error("duplicate message identifier: {0}")]
    DuplicateMessage(ChatMessageId),

    /// The message was not found.
    #[error("message not found: {0}")]
    NotFound(ChatMessageId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ChatRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
