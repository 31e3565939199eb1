//! In-memory user statistics repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::marketplace::{
    domain::{UserId, UserStats},
    ports::{
        CompletionTally, UserStatsRepository, UserStatsRepositoryError,
        UserStatsRepositoryResult,
    },
};

/// Thread-safe in-memory counter store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStatsRepository {
    state: Arc<RwLock<HashMap<UserId, UserStats>>>,
}

impl InMemoryUserStatsRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn update<F>(&self, apply: F) -> UserStatsRepositoryResult<()>
    where
        F: FnOnce(&mut HashMap<UserId, UserStats>),
    {
        let mut state = self.state.write().map_err(|err| {
            UserStatsRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        apply(&mut state);
        Ok(())
    }
}

fn entry(state: &mut HashMap<UserId, UserStats>, user: UserId) -> &mut UserStats {
    state.entry(user).or_insert_with(|| UserStats::empty(user))
}

#[async_trait]
impl UserStatsRepository for InMemoryUserStatsRepository {
    async fn record_posted(&self, user: UserId) -> UserStatsRepositoryResult<()> {
        self.update(|state| {
            let stats = entry(state, user);
            stats.tasks_posted = stats.tasks_posted.saturating_add(1);
        })
    }

    async fn record_completion(&self, tally: CompletionTally) -> UserStatsRepositoryResult<()> {
        self.update(|state| {
            let poster = entry(state, tally.poster);
            poster.total_spent = poster.total_spent.saturating_add(u64::from(tally.amount));

            let assignee = entry(state, tally.assignee);
            assignee.tasks_completed = assignee.tasks_completed.saturating_add(1);
            assignee.total_earned = assignee.total_earned.saturating_add(u64::from(tally.amount));
            if let Some(rating) = tally.rating {
                assignee.add_rating(rating);
            }
        })
    }

    async fn find(&self, user: UserId) -> UserStatsRepositoryResult<UserStats> {
        let state = self.state.read().map_err(|err| {
            UserStatsRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state
            .get(&user)
            .cloned()
            .unwrap_or_else(|| UserStats::empty(user)))
    }
}
