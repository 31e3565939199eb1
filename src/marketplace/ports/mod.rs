//! Port contracts for the marketplace Entity Store.
//!
//! The store is expected to offer atomic conditional updates; correctness of
//! bid acceptance rests on those primitives rather than on in-process locks.

pub mod bid_repository;
pub mod stats_repository;
pub mod task_repository;

pub use bid_repository::{BidRepository, BidRepositoryError, BidRepositoryResult};
pub use stats_repository::{
    CompletionTally, UserStatsRepository, UserStatsRepositoryError, UserStatsRepositoryResult,
};
#[cfg(test)]
pub use stats_repository::MockUserStatsRepository;
pub use task_repository::{
    TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskWriteGuard,
};
