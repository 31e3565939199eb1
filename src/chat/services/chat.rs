//! Chat service: messages, edits, reactions and read receipts.

use crate::chat::{
    domain::{
        Attachment, ChatDomainError, ChatMessage, ChatMessageId, ChatRules, NewChatMessage,
        ReactionEmoji,
    },
    ports::{AttachmentStore, ChatMessageRepository, ChatRepositoryError},
};
use crate::error::{Classify, ErrorKind};
use crate::marketplace::{
    domain::{Task, TaskId, UserId},
    ports::{TaskRepository, TaskRepositoryError},
    services::Caller,
};
use crate::realtime::{
    domain::{Channel, ConnectionId, EventKind, OutboundEvent},
    ports::EventPublisher,
    services::{NotificationKind, notification},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

const MAX_WRITE_ATTEMPTS: usize = 5;

/// Request payload for sending a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    task_id: TaskId,
    caller: Caller,
    content: String,
    attachments: Vec<Attachment>,
    reply_to: Option<ChatMessageId>,
}

impl SendMessageRequest {
    /// Creates a text message request.
    #[must_use]
    pub fn new(task_id: TaskId, caller: impl Into<Caller>, content: impl Into<String>) -> Self {
        Self {
            task_id,
            caller: caller.into(),
            content: content.into(),
            attachments: Vec::new(),
            reply_to: None,
        }
    }

    /// Attaches uploaded files.
    #[must_use]
    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.attachments = attachments.into_iter().collect();
        self
    }

    /// Marks the message as a reply.
    #[must_use]
    pub const fn replying_to(mut self, message_id: ChatMessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

/// Service-level errors for chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ChatDomainError),
    /// Message repository operation failed.
    #[error(transparent)]
    Repository(#[from] ChatRepositoryError),
    /// Task lookup failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The message does not exist.
    #[error("message not found: {0}")]
    MessageNotFound(ChatMessageId),
    /// The user is not the task's poster or assignee.
    #[error("user {user} is not a participant of task {task_id}")]
    NotParticipant {
        /// Acting user.
        user: UserId,
        /// Conversation task.
        task_id: TaskId,
    },
    /// The task has no assignee to converse with yet.
    #[error("task {0} has no assignee yet")]
    NoCounterparty(TaskId),
    /// The replied-to message is deleted or belongs to another task.
    #[error("cannot reply to message {0}")]
    InvalidReply(ChatMessageId),
    /// Concurrent writers kept changing the message.
    #[error("message {0} was modified concurrently")]
    ConcurrentModification(ChatMessageId),
}

impl Classify for ChatError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(
                ChatDomainError::EmptyContent
                | ChatDomainError::ContentTooLong { .. }
                | ChatDomainError::TooManyAttachments { .. }
                | ChatDomainError::SelfAddressed
                | ChatDomainError::UnknownEmoji(_),
            )
            | Self::InvalidReply(_) => ErrorKind::Validation,
            Self::Domain(ChatDomainError::NotAuthor(_)) | Self::NotParticipant { .. } => {
                ErrorKind::AccessDenied
            }
            Self::Domain(
                ChatDomainError::EditWindowElapsed(_) | ChatDomainError::MessageDeleted(_),
            )
            | Self::NoCounterparty(_)
            | Self::ConcurrentModification(_) => ErrorKind::InvalidTransition,
            Self::Domain(ChatDomainError::NoReaction(_))
            | Self::Repository(ChatRepositoryError::NotFound(_))
            | Self::TaskRepository(TaskRepositoryError::NotFound(_))
            | Self::TaskNotFound(_)
            | Self::MessageNotFound(_) => ErrorKind::NotFound,
            Self::Repository(_) | Self::TaskRepository(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for chat service operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Chat orchestration service.
///
/// Participation is re-read from the task store on every call.
#[derive(Clone)]
pub struct ChatService<T, M, A, C>
where
    T: TaskRepository,
    M: ChatMessageRepository,
    A: AttachmentStore,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    messages: Arc<M>,
    attachments: Arc<A>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<C>,
    rules: ChatRules,
}

impl<T, M, A, C> ChatService<T, M, A, C>
where
    T: TaskRepository,
    M: ChatMessageRepository,
    A: AttachmentStore,
    C: Clock + Send + Sync,
{
    /// Creates a chat service with default rules.
    #[must_use]
    pub fn new(
        tasks: Arc<T>,
        messages: Arc<M>,
        attachments: Arc<A>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tasks,
            messages,
            attachments,
            publisher,
            clock,
            rules: ChatRules::default(),
        }
    }

    /// Replaces the chat rules.
    #[must_use]
    pub const fn with_rules(mut self, rules: ChatRules) -> Self {
        self.rules = rules;
        self
    }

    /// Sends a message to the other participant of the task.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::NotParticipant`], [`ChatError::NoCounterparty`]
    /// before assignment, [`ChatError::InvalidReply`] and content validation
    /// errors.
    pub async fn send_message(&self, request: SendMessageRequest) -> ChatResult<ChatMessage> {
        let sender = request.caller.user;
        let task = self.participant_task(request.task_id, sender).await?;
        let receiver = task
            .counterparty_of(sender)
            .ok_or(ChatError::NoCounterparty(task.id()))?;
        if let Some(reply_to) = request.reply_to {
            let parent = self.messages.find_by_id(reply_to).await?;
            if !parent.is_some_and(|found| found.task_id() == task.id() && !found.is_deleted()) {
                return Err(ChatError::InvalidReply(reply_to));
            }
        }

        let message = ChatMessage::new(
            NewChatMessage {
                task_id: task.id(),
                sender,
                receiver,
                content: request.content,
                attachments: request.attachments,
                reply_to: request.reply_to,
            },
            &self.rules,
            &*self.clock,
        )?;
        self.messages.store(&message).await?;
        info!(task_id = %task.id(), message_id = %message.id(), "message sent");

        self.publish(&message, EventKind::NewMessage, message_payload(&message), request.caller.origin);
        let mut context = Map::new();
        context.insert("taskId".to_owned(), json!(task.id()));
        context.insert("messageId".to_owned(), json!(message.id()));
        context.insert("senderId".to_owned(), json!(sender));
        context.insert("title".to_owned(), Value::String(task.title().to_owned()));
        self.publisher
            .publish(notification(receiver, NotificationKind::NewMessage, context));
        Ok(message)
    }

    /// Edits a message within the edit window. Sender only.
    ///
    /// # Errors
    ///
    /// Returns an invalid-transition error once the window has elapsed or
    /// the message was deleted, and an access error for anyone but the
    /// sender.
    pub async fn edit_message(
        &self,
        message_id: ChatMessageId,
        caller: impl Into<Caller>,
        content: &str,
    ) -> ChatResult<ChatMessage> {
        let caller = caller.into();
        let (message, ()) = self
            .modify(message_id, caller.user, |message| {
                message.edit(caller.user, content, &self.rules, &*self.clock)
            })
            .await?;
        info!(%message_id, "message edited");
        self.publish(
            &message,
            EventKind::MessageEdited,
            json!({
                "messageId": message.id(),
                "taskId": message.task_id(),
                "content": message.content(),
                "editedAt": message.edited_at(),
            }),
            caller.origin,
        );
        Ok(message)
    }

    /// Soft-deletes a message and removes its stored attachments. Sender
    /// only.
    ///
    /// Attachment removal failures are logged and do not fail the call.
    ///
    /// # Errors
    ///
    /// Returns an access error for anyone but the sender and an
    /// invalid-transition error when already deleted.
    pub async fn delete_message(
        &self,
        message_id: ChatMessageId,
        caller: impl Into<Caller>,
    ) -> ChatResult<()> {
        let caller = caller.into();
        let (message, detached) = self
            .modify(message_id, caller.user, |message| {
                message.soft_delete(caller.user, &*self.clock)
            })
            .await?;
        for attachment in &detached {
            if let Err(error) = self.attachments.remove(attachment).await {
                warn!(
                    %message_id,
                    storage_key = %attachment.storage_key,
                    %error,
                    "failed to remove attachment"
                );
            }
        }
        info!(%message_id, attachments = detached.len(), "message deleted");
        self.publish(
            &message,
            EventKind::MessageDeleted,
            json!({ "messageId": message.id(), "taskId": message.task_id() }),
            caller.origin,
        );
        Ok(())
    }

    /// Sets the caller's reaction, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an emoji outside the whitelist.
    pub async fn add_reaction(
        &self,
        message_id: ChatMessageId,
        caller: impl Into<Caller>,
        emoji: &str,
    ) -> ChatResult<ChatMessage> {
        let caller = caller.into();
        let emoji = ReactionEmoji::try_from(emoji)?;
        let (message, replaced) = self
            .modify(message_id, caller.user, |message| {
                message.react(caller.user, emoji, &*self.clock)
            })
            .await?;
        self.publish(
            &message,
            EventKind::ReactionAdded,
            json!({
                "messageId": message.id(),
                "taskId": message.task_id(),
                "userId": caller.user,
                "emoji": emoji.glyph(),
                "replaced": replaced.map(ReactionEmoji::glyph),
            }),
            caller.origin,
        );
        Ok(message)
    }

    /// Removes the caller's reaction.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the caller had no reaction.
    pub async fn remove_reaction(
        &self,
        message_id: ChatMessageId,
        caller: impl Into<Caller>,
    ) -> ChatResult<ChatMessage> {
        let caller = caller.into();
        let (message, removed) = self
            .modify(message_id, caller.user, |message| {
                message.remove_reaction(caller.user, &*self.clock)
            })
            .await?;
        self.publish(
            &message,
            EventKind::ReactionRemoved,
            json!({
                "messageId": message.id(),
                "taskId": message.task_id(),
                "userId": caller.user,
                "emoji": removed.glyph(),
            }),
            caller.origin,
        );
        Ok(message)
    }

    /// Marks every unread message addressed to the caller on the task as
    /// read and returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::NotParticipant`] for outsiders.
    pub async fn mark_as_read(
        &self,
        task_id: TaskId,
        caller: impl Into<Caller>,
    ) -> ChatResult<usize> {
        let caller = caller.into();
        self.participant_task(task_id, caller.user).await?;
        let read_at = self.clock.utc();
        let changed = self.messages.mark_read(task_id, caller.user, read_at).await?;
        if !changed.is_empty() {
            self.publisher.publish(
                OutboundEvent::new(
                    Channel::Task(task_id),
                    EventKind::MessagesRead,
                    json!({
                        "taskId": task_id,
                        "readerId": caller.user,
                        "messageIds": changed,
                        "readAt": read_at,
                    }),
                )
                .with_origin(caller.origin),
            );
        }
        Ok(changed.len())
    }

    /// Returns a page of the conversation, oldest first.
    ///
    /// `limit` is capped at the configured page size.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::NotParticipant`] for outsiders.
    pub async fn list_messages(
        &self,
        task_id: TaskId,
        viewer: UserId,
        before: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> ChatResult<Vec<ChatMessage>> {
        self.participant_task(task_id, viewer).await?;
        let page_size = self.rules.page_size.max(1);
        let limit = limit.unwrap_or(page_size).clamp(1, page_size);
        Ok(self.messages.find_by_task(task_id, before, limit).await?)
    }

    /// Counts unread messages addressed to `user` across all tasks.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Repository`] when the lookup fails.
    pub async fn unread_count(&self, user: UserId) -> ChatResult<u32> {
        Ok(self.messages.count_unread(user).await?)
    }

    async fn participant_task(&self, task_id: TaskId, user: UserId) -> ChatResult<Task> {
        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(ChatError::TaskNotFound(task_id))?;
        if !task.is_participant(user) {
            return Err(ChatError::NotParticipant { user, task_id });
        }
        Ok(task)
    }

    async fn participant_message(
        &self,
        message_id: ChatMessageId,
        user: UserId,
    ) -> ChatResult<ChatMessage> {
        let message = self
            .messages
            .find_by_id(message_id)
            .await?
            .ok_or(ChatError::MessageNotFound(message_id))?;
        self.participant_task(message.task_id(), user).await?;
        Ok(message)
    }

    /// Applies `change` to the freshest copy of the message and writes it
    /// back guarded on the version it was read at, re-reading after a lost
    /// race.
    async fn modify<R, F>(
        &self,
        message_id: ChatMessageId,
        user: UserId,
        mut change: F,
    ) -> ChatResult<(ChatMessage, R)>
    where
        F: FnMut(&mut ChatMessage) -> Result<R, ChatDomainError>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut message = self.participant_message(message_id, user).await?;
            let expected = message.version();
            let outcome = change(&mut message)?;
            if let Some(stored) = self.messages.update_if(&message, expected).await? {
                return Ok((stored, outcome));
            }
            debug!(%message_id, attempt, "message changed underneath; retrying");
        }
        warn!(%message_id, "giving up after repeated concurrent changes");
        Err(ChatError::ConcurrentModification(message_id))
    }

    fn publish(
        &self,
        message: &ChatMessage,
        kind: EventKind,
        payload: Value,
        origin: Option<ConnectionId>,
    ) {
        self.publisher.publish(
            OutboundEvent::new(Channel::Task(message.task_id()), kind, payload).with_origin(origin),
        );
    }
}

fn message_payload(message: &ChatMessage) -> Value {
    serde_json::to_value(message).unwrap_or_else(|error| {
        warn!(message_id = %message.id(), %error, "failed to serialise message");
        json!({ "id": message.id(), "taskId": message.task_id() })
    })
}
