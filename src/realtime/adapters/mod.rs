//! Adapter implementations for real-time ports.

mod recording;
mod static_tokens;
mod task_access;

pub use recording::RecordingEventPublisher;
pub use static_tokens::StaticTokenVerifier;
pub use task_access::TaskChannelAccess;
