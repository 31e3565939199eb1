//! Port contracts for chat persistence and attachment storage.

mod attachment_store;
mod repository;

#[cfg(test)]
pub use attachment_store::MockAttachmentStore;
pub use attachment_store::{AttachmentStore, AttachmentStoreError};
pub use repository::{ChatMessageRepository, ChatRepositoryError, ChatRepositoryResult};
