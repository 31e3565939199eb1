//! Chat domain errors.

use super::ChatMessageId;
use thiserror::Error;

/// Errors returned while constructing or mutating chat messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatDomainError {
    /// The message has neither text nor attachments.
    #[error("message must contain text or at least one attachment")]
    EmptyContent,

    /// The message text exceeds the configured limit.
    #[error("message exceeds {max} characters")]
    ContentTooLong {
        /// Configured limit.
        max: usize,
    },

    /// The message carries too many attachments.
    #[error("message carries more than {max} attachments")]
    TooManyAttachments {
        /// Configured limit.
        max: usize,
    },

    /// Sender and receiver are the same user.
    #[error("a message cannot be addressed to its sender")]
    SelfAddressed,

    /// Only the sender may change the message.
    #[error("only the sender may modify message {0}")]
    NotAuthor(ChatMessageId),

    /// The edit window has closed.
    #[error("the edit window for message {0} has elapsed")]
    EditWindowElapsed(ChatMessageId),

    /// The message was deleted.
    #[error("message {0} has been deleted")]
    MessageDeleted(ChatMessageId),

    /// The emoji is not on the whitelist.
    #[error("unsupported reaction: {0}")]
    UnknownEmoji(String),

    /// The user has no reaction on the message.
    #[error("no reaction to remove on message {0}")]
    NoReaction(ChatMessageId),
}
