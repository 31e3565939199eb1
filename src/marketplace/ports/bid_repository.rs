//! Repository port for bids, including the atomic acceptance primitives.

use crate::marketplace::domain::{Bid, BidId, BidStatus, TaskId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for bid repository operations.
pub type BidRepositoryResult<T> = Result<T, BidRepositoryError>;

/// Bid persistence contract.
#[async_trait]
pub trait BidRepository: Send + Sync {
    /// Stores a new bid.
    ///
    /// The uniqueness check and the insert are a single atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`BidRepositoryError::DuplicateActiveBid`] when the bidder
    /// already holds a non-withdrawn bid on the task.
    async fn store(&self, bid: &Bid) -> BidRepositoryResult<()>;

    /// Finds a bid by identifier.
    async fn find_by_id(&self, id: BidId) -> BidRepositoryResult<Option<Bid>>;

    /// Returns every bid on a task, oldest first.
    async fn find_by_task(&self, task_id: TaskId) -> BidRepositoryResult<Vec<Bid>>;

    /// Returns every bid placed by a user, oldest first.
    async fn find_by_bidder(&self, bidder: UserId) -> BidRepositoryResult<Vec<Bid>>;

    /// Replaces the stored bid when its status is still `expected`.
    ///
    /// Returns `false` when the stored status differs.
    ///
    /// # Errors
    ///
    /// Returns [`BidRepositoryError::NotFound`] when the bid does not exist.
    async fn transition_if(&self, bid: &Bid, expected: BidStatus) -> BidRepositoryResult<bool>;

    /// Writes an accepted bid when the stored copy is still pending and no
    /// other bid on the task is accepted.
    ///
    /// Returns `false` when another decision already committed.
    ///
    /// # Errors
    ///
    /// Returns [`BidRepositoryError::NotFound`] when the bid does not exist.
    async fn accept_if_pending(&self, bid: &Bid) -> BidRepositoryResult<bool>;

    /// Rejects every pending bid on the task except `except`, stamping `at`.
    ///
    /// Returns the bids that were rejected. Safe to retry.
    async fn reject_pending(
        &self,
        task_id: TaskId,
        except: Option<BidId>,
        at: DateTime<Utc>,
    ) -> BidRepositoryResult<Vec<Bid>>;

    /// Counts pending and accepted bids on the task.
    async fn count_live(&self, task_id: TaskId) -> BidRepositoryResult<u32>;

    /// Returns pending bids whose auto-withdraw time is at or before `now`.
    async fn find_expired_pending(&self, now: DateTime<Utc>) -> BidRepositoryResult<Vec<Bid>>;

    /// Deletes a bid when it is rejected or withdrawn. Returns `false`
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`BidRepositoryError::NotFound`] when the bid does not exist.
    async fn delete_if_terminal(&self, id: BidId) -> BidRepositoryResult<bool>;

    /// Deletes every bid on the task.
    async fn delete_by_task(&self, task_id: TaskId) -> BidRepositoryResult<()>;
}

/// Errors returned by bid repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BidRepositoryError {
    /// A bid with the same identifier already exists.
    #[error("duplicate bid identifier: {0}")]
    DuplicateBid(BidId),

    /// The bidder already holds a non-withdrawn bid on the task.
    #[error("bidder {bidder} already has an active bid on task {task_id}")]
    DuplicateActiveBid {
        /// Task identifier.
        task_id: TaskId,
        /// Bidder identifier.
        bidder: UserId,
    },

    /// The bid was not found.
    #[error("bid not found: {0}")]
    NotFound(BidId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BidRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
