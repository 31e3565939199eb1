//! Channel access policy backed by the task store.

use crate::marketplace::{
    domain::{TaskStatus, UserId},
    ports::TaskRepository,
};
use crate::realtime::{
    domain::{Channel, RealtimeError},
    ports::ChannelAccessPolicy,
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Grants `task_<id>` to its poster and assignee and `user_<id>` to that
/// user only. Reads the store on every check.
#[derive(Clone)]
pub struct TaskChannelAccess<T>
where
    T: TaskRepository,
{
    tasks: Arc<T>,
}

impl<T> TaskChannelAccess<T>
where
    T: TaskRepository,
{
    /// Creates a policy over `tasks`.
    #[must_use]
    pub const fn new(tasks: Arc<T>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl<T> ChannelAccessPolicy for TaskChannelAccess<T>
where
    T: TaskRepository,
{
    async fn can_join(&self, user: UserId, channel: Channel) -> Result<bool, RealtimeError> {
        match channel {
            Channel::User(owner) => Ok(owner == user),
            Channel::Task(task_id) => {
                let task = self
                    .tasks
                    .find_by_id(task_id)
                    .await
                    .map_err(RealtimeError::access_check)?;
                Ok(task.is_some_and(|found| found.is_participant(user)))
            }
        }
    }

    async fn active_counterparties(&self, user: UserId) -> Result<Vec<UserId>, RealtimeError> {
        let tasks = self
            .tasks
            .find_by_participant(user)
            .await
            .map_err(RealtimeError::access_check)?;
        let counterparties: BTreeSet<UserId> = tasks
            .iter()
            .filter(|task| {
                matches!(task.status(), TaskStatus::Assigned | TaskStatus::InProgress)
            })
            .filter_map(|task| task.counterparty_of(user))
            .collect();
        Ok(counterparties.into_iter().collect())
    }
}
