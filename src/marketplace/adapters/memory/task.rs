//! In-memory task repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::marketplace::{
    domain::{Task, TaskCategory, TaskId, TaskStatus, UserId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskWriteGuard},
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, HashMap<TaskId, Task>>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, HashMap<TaskId, Task>>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn oldest_first(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|task| (task.created_at(), task.id()));
    tasks
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.write()?;
        if tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn update_if(&self, task: &Task, guard: TaskWriteGuard) -> TaskRepositoryResult<bool> {
        let mut tasks = self.write()?;
        let stored = tasks
            .get_mut(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        if !guard.admits(stored) {
            return Ok(false);
        }
        let bid_count = stored.bid_count();
        *stored = task.clone();
        stored.set_bid_count(bid_count);
        Ok(true)
    }

    async fn delete_if(&self, id: TaskId, guard: TaskWriteGuard) -> TaskRepositoryResult<bool> {
        let mut tasks = self.write()?;
        let stored = tasks.get(&id).ok_or(TaskRepositoryError::NotFound(id))?;
        if !guard.admits(stored) {
            return Ok(false);
        }
        tasks.remove(&id);
        Ok(true)
    }

    async fn set_bid_count(&self, id: TaskId, count: u32) -> TaskRepositoryResult<()> {
        let mut tasks = self.write()?;
        let stored = tasks.get_mut(&id).ok_or(TaskRepositoryError::NotFound(id))?;
        stored.set_bid_count(count);
        Ok(())
    }

    async fn list_by_status(
        &self,
        status: TaskStatus,
        category: Option<TaskCategory>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.read()?;
        let matching = tasks
            .values()
            .filter(|task| task.status() == status)
            .filter(|task| category.is_none_or(|wanted| task.category() == wanted))
            .cloned()
            .collect();
        Ok(oldest_first(matching))
    }

    async fn find_by_participant(&self, user: UserId) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.read()?;
        let matching = tasks
            .values()
            .filter(|task| task.is_participant(user))
            .cloned()
            .collect();
        Ok(oldest_first(matching))
    }
}
