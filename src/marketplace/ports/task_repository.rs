//! Repository port for task persistence and guarded updates.

use crate::marketplace::domain::{Task, TaskCategory, TaskId, TaskStatus, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Condition the stored task must satisfy for a guarded write to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskWriteGuard {
    /// Status the stored task must currently have.
    pub expected_status: TaskStatus,
    /// Whether the stored bid count must be zero.
    pub require_no_bids: bool,
}

impl TaskWriteGuard {
    /// Guard that only checks the current status.
    #[must_use]
    pub const fn status(expected_status: TaskStatus) -> Self {
        Self {
            expected_status,
            require_no_bids: false,
        }
    }

    /// Guard for edits: the task must be open with no live bids.
    #[must_use]
    pub const fn editable() -> Self {
        Self {
            expected_status: TaskStatus::Open,
            require_no_bids: true,
        }
    }

    /// Returns `true` when `stored` satisfies the guard.
    #[must_use]
    pub fn admits(self, stored: &Task) -> bool {
        stored.status() == self.expected_status
            && (!self.require_no_bids || stored.bid_count() == 0)
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the identifier
    /// already exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Replaces the stored task when `guard` holds for the stored copy.
    ///
    /// The stored bid count is preserved; it is only written through
    /// [`TaskRepository::set_bid_count`]. Returns `false` when the guard
    /// rejected the write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update_if(&self, task: &Task, guard: TaskWriteGuard) -> TaskRepositoryResult<bool>;

    /// Deletes the task when `guard` holds. Returns `false` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn delete_if(&self, id: TaskId, guard: TaskWriteGuard) -> TaskRepositoryResult<bool>;

    /// Overwrites the cached bid count.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn set_bid_count(&self, id: TaskId, count: u32) -> TaskRepositoryResult<()>;

    /// Returns tasks in `status`, optionally filtered by category, oldest
    /// first.
    async fn list_by_status(
        &self,
        status: TaskStatus,
        category: Option<TaskCategory>,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns tasks the user posted or is assigned to.
    async fn find_by_participant(&self, user: UserId) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
