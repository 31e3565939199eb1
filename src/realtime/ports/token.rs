//! Credential verification performed during the authenticate handshake.

use crate::marketplace::domain::UserId;
use async_trait::async_trait;

/// Resolves a bearer token to a user identity.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Returns the identity behind `token`, or `None` when it is invalid.
    async fn verify(&self, token: &str) -> Option<UserId>;
}
