//! Port contracts for the real-time fabric.

mod access;
mod publisher;
mod token;

#[cfg(test)]
pub use access::MockChannelAccessPolicy;
pub use access::ChannelAccessPolicy;
pub use publisher::EventPublisher;
pub use token::TokenVerifier;
