//! Error types for marketplace domain validation and transitions.

use super::{BidId, BidStatus, TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating marketplace values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarketplaceDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the configured limit.
    #[error("task title exceeds {max} characters")]
    TitleTooLong {
        /// Configured limit.
        max: usize,
    },

    /// The task description is empty after trimming.
    #[error("task description must not be empty")]
    EmptyDescription,

    /// The task description exceeds the configured limit.
    #[error("task description exceeds {max} characters")]
    DescriptionTooLong {
        /// Configured limit.
        max: usize,
    },

    /// The category is not one of the supported values.
    #[error("unsupported task category: {0}")]
    InvalidCategory(String),

    /// The budget range is inverted.
    #[error("budget minimum {min} exceeds maximum {max}")]
    InvertedBudget {
        /// Requested minimum.
        min: u32,
        /// Requested maximum.
        max: u32,
    },

    /// The budget range leaves the platform-wide bounds.
    #[error("budget {min}..={max} is outside the permitted range {floor}..={ceiling}")]
    BudgetOutsideBounds {
        /// Requested minimum.
        min: u32,
        /// Requested maximum.
        max: u32,
        /// Platform lower bound.
        floor: u32,
        /// Platform upper bound.
        ceiling: u32,
    },

    /// The deadline is not strictly in the future.
    #[error("task deadline must be in the future")]
    DeadlineNotInFuture,

    /// The proposed timeline is empty after trimming.
    #[error("proposed timeline must not be empty")]
    EmptyTimeline,

    /// The proposed timeline exceeds 200 characters.
    #[error("proposed timeline exceeds 200 characters")]
    TimelineTooLong,

    /// The rating lies outside 1 to 5.
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    /// A review was supplied without a rating.
    #[error("a review requires a rating")]
    ReviewWithoutRating,

    /// The task may only be edited while open and without live bids.
    #[error("task {0} can no longer be edited")]
    TaskLocked(TaskId),

    /// The task state machine forbids the transition.
    #[error("invalid task transition for {task_id}: {from} -> {to}")]
    InvalidTaskTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The bid state machine forbids the transition.
    #[error("invalid bid transition for {bid_id}: {from} -> {to}")]
    InvalidBidTransition {
        /// Bid identifier.
        bid_id: BidId,
        /// Current status.
        from: BidStatus,
        /// Requested status.
        to: BidStatus,
    },
}

/// Error returned while parsing a task status from an external value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing a bid status from an external value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown bid status: {0}")]
pub struct ParseBidStatusError(pub String);
