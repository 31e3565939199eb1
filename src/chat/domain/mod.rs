//! Domain model for task conversations.
//!
//! A conversation belongs to one task and has exactly two parties: the
//! poster and the assignee.

mod error;
mod ids;
mod message;
mod reaction;
mod rules;

pub use error::ChatDomainError;
pub use ids::ChatMessageId;
pub use message::{Attachment, ChatMessage, NewChatMessage};
pub use reaction::{Reaction, ReactionEmoji};
pub use rules::ChatRules;
