//! Repository port for aggregate per-user counters.

use crate::marketplace::domain::{Rating, UserId, UserStats};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for user statistics repository operations.
pub type UserStatsRepositoryResult<T> = Result<T, UserStatsRepositoryError>;

/// Counter updates applied when a task completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionTally {
    /// Task poster, whose spending grows.
    pub poster: UserId,
    /// Assignee, whose earnings and completion count grow.
    pub assignee: UserId,
    /// Accepted bid amount.
    pub amount: u32,
    /// Rating given to the assignee.
    pub rating: Option<Rating>,
}

/// Aggregate counter store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStatsRepository: Send + Sync {
    /// Increments the posted-task counter.
    async fn record_posted(&self, user: UserId) -> UserStatsRepositoryResult<()>;

    /// Applies the counters of a completed task to both parties atomically.
    async fn record_completion(&self, tally: CompletionTally) -> UserStatsRepositoryResult<()>;

    /// Returns the counters for `user`, zeroed when nothing was recorded.
    async fn find(&self, user: UserId) -> UserStatsRepositoryResult<UserStats>;
}

/// Errors returned by user statistics repositories.
#[derive(Debug, Clone, Error)]
pub enum UserStatsRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl UserStatsRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
