//! Typing indicators with server-enforced expiry.

use crate::marketplace::domain::{TaskId, UserId};
use crate::realtime::{
    domain::{Channel, ConnectionId, EventKind, OutboundEvent},
    ports::EventPublisher,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::debug;

type TypingKey = (TaskId, UserId);

#[derive(Debug)]
struct TypingTimer {
    generation: u64,
    expiry: AbortHandle,
}

#[derive(Debug, Default)]
struct TypingState {
    timers: HashMap<TypingKey, TypingTimer>,
    next_generation: u64,
}

/// Tracks who is typing in which task conversation.
///
/// Each `(task, user)` pair owns one expiry timer; a refresh replaces it and
/// an expiry emits `stopped_typing` without client involvement. Must be used
/// from within a Tokio runtime.
#[derive(Clone)]
pub struct TypingTracker {
    ttl: Duration,
    publisher: Arc<dyn EventPublisher>,
    state: Arc<Mutex<TypingState>>,
}

fn lock(state: &Mutex<TypingState>) -> MutexGuard<'_, TypingState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn typing_event(task_id: TaskId, user: UserId, kind: EventKind) -> OutboundEvent {
    OutboundEvent::new(
        Channel::Task(task_id),
        kind,
        json!({ "taskId": task_id, "userId": user }),
    )
}

impl TypingTracker {
    /// Creates a tracker whose indicators expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            ttl,
            publisher,
            state: Arc::new(Mutex::new(TypingState::default())),
        }
    }

    /// Records a keystroke, publishing `user_typing` when the user was not
    /// already typing and resetting the expiry timer.
    pub fn start(&self, task_id: TaskId, user: UserId, origin: Option<ConnectionId>) {
        let key = (task_id, user);
        let mut state = lock(&self.state);
        state.next_generation = state.next_generation.wrapping_add(1);
        let generation = state.next_generation;

        let expiry = self.spawn_expiry(key, generation);
        let previous = state.timers.insert(key, TypingTimer { generation, expiry });
        drop(state);

        match previous {
            Some(timer) => timer.expiry.abort(),
            None => self
                .publisher
                .publish(typing_event(task_id, user, EventKind::UserTyping).with_origin(origin)),
        }
    }

    /// Clears the indicator and publishes `stopped_typing` when it was set.
    ///
    /// Returns `false` when the user was not typing.
    pub fn stop(&self, task_id: TaskId, user: UserId, origin: Option<ConnectionId>) -> bool {
        let removed = lock(&self.state).timers.remove(&(task_id, user));
        let Some(timer) = removed else {
            return false;
        };
        timer.expiry.abort();
        self.publisher
            .publish(typing_event(task_id, user, EventKind::StoppedTyping).with_origin(origin));
        true
    }

    /// Clears every indicator of `user`, publishing `stopped_typing` for each.
    pub fn stop_all_for(&self, user: UserId) -> usize {
        let removed: Vec<(TypingKey, TypingTimer)> = {
            let mut state = lock(&self.state);
            let keys: Vec<TypingKey> = state
                .timers
                .keys()
                .filter(|(_, typist)| *typist == user)
                .copied()
                .collect();
            keys.into_iter()
                .filter_map(|key| state.timers.remove(&key).map(|timer| (key, timer)))
                .collect()
        };
        for ((task_id, typist), timer) in &removed {
            timer.expiry.abort();
            self.publisher
                .publish(typing_event(*task_id, *typist, EventKind::StoppedTyping));
        }
        removed.len()
    }

    /// Returns `true` while the indicator for `(task, user)` is set.
    #[must_use]
    pub fn is_typing(&self, task_id: TaskId, user: UserId) -> bool {
        lock(&self.state).timers.contains_key(&(task_id, user))
    }

    fn spawn_expiry(&self, key: TypingKey, generation: u64) -> AbortHandle {
        let ttl = self.ttl;
        let state = Arc::clone(&self.state);
        let publisher = Arc::clone(&self.publisher);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let expired = {
                let mut guard = lock(&state);
                let current = guard
                    .timers
                    .get(&key)
                    .is_some_and(|timer| timer.generation == generation);
                if current {
                    guard.timers.remove(&key);
                }
                current
            };
            if expired {
                let (task_id, user) = key;
                debug!(%task_id, user_id = %user, "typing indicator expired");
                publisher.publish(typing_event(task_id, user, EventKind::StoppedTyping));
            }
        })
        .abort_handle()
    }
}
