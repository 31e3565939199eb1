//! Chat orchestration.

mod chat;

pub use chat::{ChatError, ChatResult, ChatService, SendMessageRequest};
