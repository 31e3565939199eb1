//! In-memory chat adapters.

mod attachments;
mod messages;

pub use attachments::InMemoryAttachmentStore;
pub use messages::InMemoryChatMessageRepository;
