//! Capability checks for joining channels and presence fan-out.

use crate::marketplace::domain::UserId;
use crate::realtime::domain::{Channel, RealtimeError};
use async_trait::async_trait;

/// Decides which identities may subscribe to which channels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelAccessPolicy: Send + Sync {
    /// Returns `true` when `user` may join `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::AccessCheck`] when the check cannot be
    /// evaluated.
    async fn can_join(&self, user: UserId, channel: Channel) -> Result<bool, RealtimeError>;

    /// Returns every user sharing an assigned or in-progress task with
    /// `user`.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::AccessCheck`] when the lookup fails.
    async fn active_counterparties(&self, user: UserId) -> Result<Vec<UserId>, RealtimeError>;
}
