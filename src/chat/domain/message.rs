//! Chat message entity.

use super::{ChatDomainError, ChatMessageId, ChatRules, Reaction, ReactionEmoji};
use crate::marketplace::domain::{TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Reference to a file held by the external attachment store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attachment {
    /// Key of the stored object.
    pub storage_key: String,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// Input for a new message. The receiver is resolved from the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatMessage {
    /// Conversation task.
    pub task_id: TaskId,
    /// Sending participant.
    pub sender: UserId,
    /// Receiving participant.
    pub receiver: UserId,
    /// Raw message text.
    pub content: String,
    /// Attached files.
    pub attachments: Vec<Attachment>,
    /// Message being replied to.
    pub reply_to: Option<ChatMessageId>,
}

/// A message exchanged between the poster and the assignee of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    id: ChatMessageId,
    task_id: TaskId,
    sender: UserId,
    receiver: UserId,
    content: String,
    attachments: Vec<Attachment>,
    read_at: Option<DateTime<Utc>>,
    edited_at: Option<DateTime<Utc>>,
    original_content: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    reactions: Vec<Reaction>,
    reply_to: Option<ChatMessageId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    version: u64,
}

impl ChatMessage {
    /// Creates a message.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError`] when sender and receiver coincide or the
    /// content or attachments break the configured limits.
    pub fn new(
        input: NewChatMessage,
        rules: &ChatRules,
        clock: &impl Clock,
    ) -> Result<Self, ChatDomainError> {
        if input.sender == input.receiver {
            return Err(ChatDomainError::SelfAddressed);
        }
        if input.attachments.len() > rules.max_attachments {
            return Err(ChatDomainError::TooManyAttachments {
                max: rules.max_attachments,
            });
        }
        let content = validate_content(&input.content, !input.attachments.is_empty(), rules)?;
        let now = clock.utc();
        Ok(Self {
            id: ChatMessageId::new(),
            task_id: input.task_id,
            sender: input.sender,
            receiver: input.receiver,
            content,
            attachments: input.attachments,
            read_at: None,
            edited_at: None,
            original_content: None,
            deleted_at: None,
            reactions: Vec::new(),
            reply_to: input.reply_to,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> ChatMessageId {
        self.id
    }

    /// Returns the conversation task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the sender.
    #[must_use]
    pub const fn sender(&self) -> UserId {
        self.sender
    }

    /// Returns the receiver.
    #[must_use]
    pub const fn receiver(&self) -> UserId {
        self.receiver
    }

    /// Returns the current text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the attachments.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Returns when the receiver read the message.
    #[must_use]
    pub const fn read_at(&self) -> Option<DateTime<Utc>> {
        self.read_at
    }

    /// Returns `true` once read.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Returns when the message was last edited.
    #[must_use]
    pub const fn edited_at(&self) -> Option<DateTime<Utc>> {
        self.edited_at
    }

    /// Returns `true` once edited.
    #[must_use]
    pub const fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// Returns the text as first sent, once edited.
    #[must_use]
    pub fn original_content(&self) -> Option<&str> {
        self.original_content.as_deref()
    }

    /// Returns `true` once soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the reactions, one per user.
    #[must_use]
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Returns the message replied to.
    #[must_use]
    pub const fn reply_to(&self) -> Option<ChatMessageId> {
        self.reply_to
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the store revision, advanced on every persisted change.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    pub(crate) const fn advance_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }

    /// Replaces the text within the edit window. Sender only.
    ///
    /// The first edit preserves the original text.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError::NotAuthor`],
    /// [`ChatDomainError::MessageDeleted`],
    /// [`ChatDomainError::EditWindowElapsed`] or a content validation error.
    pub fn edit(
        &mut self,
        editor: UserId,
        content: &str,
        rules: &ChatRules,
        clock: &impl Clock,
    ) -> Result<(), ChatDomainError> {
        self.ensure_live_and_authored(editor)?;
        let now = clock.utc();
        if now - self.created_at > rules.edit_window {
            return Err(ChatDomainError::EditWindowElapsed(self.id));
        }
        let content = validate_content(content, !self.attachments.is_empty(), rules)?;
        if self.original_content.is_none() {
            self.original_content = Some(std::mem::take(&mut self.content));
        }
        self.content = content;
        self.edited_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Soft-deletes the message and detaches its attachments. Sender only.
    ///
    /// Returns the detached attachments so their stored files can be removed.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError::NotAuthor`] or
    /// [`ChatDomainError::MessageDeleted`].
    pub fn soft_delete(
        &mut self,
        actor: UserId,
        clock: &impl Clock,
    ) -> Result<Vec<Attachment>, ChatDomainError> {
        self.ensure_live_and_authored(actor)?;
        let now = clock.utc();
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(std::mem::take(&mut self.attachments))
    }

    /// Sets the user's reaction, replacing any earlier one.
    ///
    /// Returns the replaced emoji.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError::MessageDeleted`].
    pub fn react(
        &mut self,
        user: UserId,
        emoji: ReactionEmoji,
        clock: &impl Clock,
    ) -> Result<Option<ReactionEmoji>, ChatDomainError> {
        self.ensure_live()?;
        let now = clock.utc();
        let reaction = Reaction {
            user,
            emoji,
            reacted_at: now,
        };
        let previous = match self.reactions.iter_mut().find(|existing| existing.user == user) {
            Some(existing) => Some(std::mem::replace(existing, reaction).emoji),
            None => {
                self.reactions.push(reaction);
                None
            }
        };
        self.updated_at = now;
        Ok(previous)
    }

    /// Removes the user's reaction.
    ///
    /// # Errors
    ///
    /// Returns [`ChatDomainError::NoReaction`] when the user had none, or
    /// [`ChatDomainError::MessageDeleted`].
    pub fn remove_reaction(
        &mut self,
        user: UserId,
        clock: &impl Clock,
    ) -> Result<ReactionEmoji, ChatDomainError> {
        self.ensure_live()?;
        let index = self
            .reactions
            .iter()
            .position(|existing| existing.user == user)
            .ok_or(ChatDomainError::NoReaction(self.id))?;
        let removed = self.reactions.remove(index);
        self.updated_at = clock.utc();
        Ok(removed.emoji)
    }

    /// Marks the message read by `reader` at `at`.
    ///
    /// Returns `false` when `reader` is not the receiver or it was already
    /// read.
    pub fn mark_read(&mut self, reader: UserId, at: DateTime<Utc>) -> bool {
        if self.receiver != reader || self.read_at.is_some() || self.is_deleted() {
            return false;
        }
        self.read_at = Some(at);
        true
    }

    fn ensure_live(&self) -> Result<(), ChatDomainError> {
        if self.is_deleted() {
            return Err(ChatDomainError::MessageDeleted(self.id));
        }
        Ok(())
    }

    fn ensure_live_and_authored(&self, user: UserId) -> Result<(), ChatDomainError> {
        if self.sender != user {
            return Err(ChatDomainError::NotAuthor(self.id));
        }
        self.ensure_live()
    }
}

fn validate_content(
    raw: &str,
    has_attachments: bool,
    rules: &ChatRules,
) -> Result<String, ChatDomainError> {
    let content = raw.trim();
    if content.is_empty() && !has_attachments {
        return Err(ChatDomainError::EmptyContent);
    }
    if content.chars().count() > rules.max_content_length {
        return Err(ChatDomainError::ContentTooLong {
            max: rules.max_content_length,
        });
    }
    Ok(content.to_owned())
}
