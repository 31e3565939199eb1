//! Tests for typing indicators and their expiry timers.

use crate::marketplace::domain::{TaskId, UserId};
use crate::realtime::{
    adapters::RecordingEventPublisher,
    domain::{Channel, EventKind},
    services::TypingTracker,
};
use eyre::ensure;
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(5);

struct Typing {
    tracker: TypingTracker,
    events: RecordingEventPublisher,
    task_id: TaskId,
    user: UserId,
}

impl Typing {
    fn count(&self, kind: EventKind) -> usize {
        self.events.events_of(kind).len()
    }
}

#[fixture]
fn typing() -> Typing {
    let events = RecordingEventPublisher::new();
    Typing {
        tracker: TypingTracker::new(TTL, Arc::new(events.clone())),
        events,
        task_id: TaskId::new(),
        user: UserId::new(),
    }
}

async fn advance(by: Duration) {
    tokio::time::sleep(by).await;
    tokio::task::yield_now().await;
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn indicator_expires_without_a_stop(typing: Typing) -> eyre::Result<()> {
    typing.tracker.start(typing.task_id, typing.user, None);
    ensure!(typing.count(EventKind::UserTyping) == 1);
    let started = typing.events.events_of(EventKind::UserTyping);
    ensure!(started
        .first()
        .is_some_and(|event| event.channel == Channel::Task(typing.task_id)));

    advance(Duration::from_secs(4)).await;
    ensure!(typing.tracker.is_typing(typing.task_id, typing.user));

    advance(Duration::from_secs(2)).await;
    ensure!(!typing.tracker.is_typing(typing.task_id, typing.user));
    ensure!(typing.count(EventKind::StoppedTyping) == 1);
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn refresh_restarts_the_timer(typing: Typing) -> eyre::Result<()> {
    typing.tracker.start(typing.task_id, typing.user, None);
    advance(Duration::from_secs(4)).await;
    typing.tracker.start(typing.task_id, typing.user, None);

    advance(Duration::from_secs(4)).await;
    ensure!(typing.tracker.is_typing(typing.task_id, typing.user));
    ensure!(typing.count(EventKind::StoppedTyping) == 0);
    ensure!(typing.count(EventKind::UserTyping) == 1, "refresh is silent");

    advance(Duration::from_secs(2)).await;
    ensure!(!typing.tracker.is_typing(typing.task_id, typing.user));
    ensure!(typing.count(EventKind::StoppedTyping) == 1);
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn explicit_stop_cancels_expiry(typing: Typing) -> eyre::Result<()> {
    typing.tracker.start(typing.task_id, typing.user, None);

    ensure!(typing.tracker.stop(typing.task_id, typing.user, None));
    ensure!(!typing.tracker.stop(typing.task_id, typing.user, None));
    advance(TTL * 2).await;

    ensure!(typing.count(EventKind::StoppedTyping) == 1);
    Ok(())
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn stop_all_clears_every_conversation(typing: Typing) -> eyre::Result<()> {
    let other_task = TaskId::new();
    let bystander = UserId::new();
    typing.tracker.start(typing.task_id, typing.user, None);
    typing.tracker.start(other_task, typing.user, None);
    typing.tracker.start(typing.task_id, bystander, None);

    ensure!(typing.tracker.stop_all_for(typing.user) == 2);

    ensure!(!typing.tracker.is_typing(other_task, typing.user));
    ensure!(typing.tracker.is_typing(typing.task_id, bystander));
    ensure!(typing.count(EventKind::StoppedTyping) == 2);
    Ok(())
}
