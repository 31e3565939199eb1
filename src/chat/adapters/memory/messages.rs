//! In-memory chat message repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::chat::{
    domain::{ChatMessage, ChatMessageId},
    ports::{ChatMessageRepository, ChatRepositoryError, ChatRepositoryResult},
};
use crate::marketplace::domain::{TaskId, UserId};

type MessageMap = HashMap<ChatMessageId, ChatMessage>;

/// Thread-safe in-memory chat message repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChatMessageRepository {
    state: Arc<RwLock<MessageMap>>,
}

impl InMemoryChatMessageRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ChatRepositoryResult<RwLockReadGuard<'_, MessageMap>> {
        self.state.read().map_err(|err| {
            ChatRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> ChatRepositoryResult<RwLockWriteGuard<'_, MessageMap>> {
        self.state.write().map_err(|err| {
            ChatRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl ChatMessageRepository for InMemoryChatMessageRepository {
    async fn store(&self, message: &ChatMessage) -> ChatRepositoryResult<()> {
        let mut messages = self.write()?;
        if messages.contains_key(&message.id()) {
            return Err(ChatRepositoryError::DuplicateMessage(message.id()));
        }
        messages.insert(message.id(), message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ChatMessageId) -> ChatRepositoryResult<Option<ChatMessage>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn update_if(
        &self,
        message: &ChatMessage,
        expected: u64,
    ) -> ChatRepositoryResult<Option<ChatMessage>> {
        let mut messages = self.write()?;
        let stored = messages
            .get_mut(&message.id())
            .ok_or(ChatRepositoryError::NotFound(message.id()))?;
        if stored.version() != expected {
            return Ok(None);
        }
        let mut next = message.clone();
        next.advance_version();
        *stored = next.clone();
        Ok(Some(next))
    }

    async fn find_by_task(
        &self,
        task_id: TaskId,
        before: Option<DateTime<Utc>>,
        limit: usize,
    ) -> ChatRepositoryResult<Vec<ChatMessage>> {
        let messages = self.read()?;
        let mut page: Vec<ChatMessage> = messages
            .values()
            .filter(|message| message.task_id() == task_id && !message.is_deleted())
            .filter(|message| before.is_none_or(|cursor| message.created_at() < cursor))
            .cloned()
            .collect();
        page.sort_by_key(|message| (message.created_at(), message.id()));
        let skip = page.len().saturating_sub(limit);
        Ok(page.split_off(skip))
    }

    async fn mark_read(
        &self,
        task_id: TaskId,
        reader: UserId,
        at: DateTime<Utc>,
    ) -> ChatRepositoryResult<Vec<ChatMessageId>> {
        let mut messages = self.write()?;
        let mut changed: Vec<(DateTime<Utc>, ChatMessageId)> = messages
            .values_mut()
            .filter(|message| message.task_id() == task_id)
            .filter_map(|message| {
                message.mark_read(reader, at).then(|| {
                    message.advance_version();
                    (message.created_at(), message.id())
                })
            })
            .collect();
        changed.sort();
        Ok(changed.into_iter().map(|(_, id)| id).collect())
    }

    async fn count_unread(&self, user: UserId) -> ChatRepositoryResult<u32> {
        let messages = self.read()?;
        let unread = messages
            .values()
            .filter(|message| {
                message.receiver() == user && !message.is_read() && !message.is_deleted()
            })
            .count();
        Ok(u32::try_from(unread).unwrap_or(u32::MAX))
    }
}
