//! Tests for the room registry and the in-process bus.

use crate::clock::ManualClock;
use crate::marketplace::domain::{TaskId, UserId};
use crate::realtime::{
    domain::{Channel, EventKind, OutboundEvent, RealtimeError, ServerFrame},
    ports::EventPublisher,
    services::{DeliveryReport, InMemoryEventBus, RoomRegistry},
};
use chrono::{DateTime, TimeZone, Utc};
use eyre::{OptionExt, bail, ensure};
use rstest::{fixture, rstest};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn message_on(channel: Channel) -> OutboundEvent {
    OutboundEvent::new(channel, EventKind::NewMessage, json!({ "content": "hi" }))
}

fn next_sequence(receiver: &mut UnboundedReceiver<ServerFrame>) -> eyre::Result<u64> {
    match receiver.try_recv() {
        Ok(ServerFrame::Event(event)) => Ok(event.sequence),
        other => bail!("expected an event frame, got {other:?}"),
    }
}

#[fixture]
fn registry() -> RoomRegistry {
    RoomRegistry::new()
}

#[rstest]
fn fan_out_skips_origin_and_numbers_events(registry: RoomRegistry) -> eyre::Result<()> {
    let channel = Channel::Task(TaskId::new());
    let (sender_a, mut inbox_a) = mpsc::unbounded_channel();
    let (sender_b, mut inbox_b) = mpsc::unbounded_channel();
    let a = registry.register(sender_a);
    let b = registry.register(sender_b);
    registry.join(a, channel)?;
    registry.join(b, channel)?;

    let report = registry.deliver(message_on(channel).with_origin(Some(a)), instant());

    ensure!(report == DeliveryReport { delivered: 1, pruned: 0 });
    ensure!(inbox_a.try_recv().is_err(), "origin must not receive its own event");
    ensure!(next_sequence(&mut inbox_b)? == 1);

    registry.deliver(message_on(channel), instant());
    ensure!(next_sequence(&mut inbox_a)? == 2);
    ensure!(next_sequence(&mut inbox_b)? == 2);
    Ok(())
}

#[rstest]
fn closed_connections_are_pruned_during_fan_out(registry: RoomRegistry) -> eyre::Result<()> {
    let channel = Channel::Task(TaskId::new());
    let (live_sender, mut live_inbox) = mpsc::unbounded_channel();
    let (dead_sender, dead_inbox) = mpsc::unbounded_channel();
    let live = registry.register(live_sender);
    let dead = registry.register(dead_sender);
    registry.join(live, channel)?;
    registry.join(dead, channel)?;
    drop(dead_inbox);

    let report = registry.deliver(message_on(channel), instant());

    ensure!(report == DeliveryReport { delivered: 1, pruned: 1 });
    ensure!(next_sequence(&mut live_inbox)? == 1);
    ensure!(registry.members(channel) == vec![live]);
    ensure!(registry.identity(dead).is_ok(), "stays registered until unregistered");
    ensure!(matches!(
        registry.join(dead, channel),
        Err(RealtimeError::UnknownConnection(_))
    ));
    ensure!(registry.members(channel) == vec![live]);

    let session = registry.unregister(dead).ok_or_eyre("pruned session is still held")?;
    ensure!(session.channels == vec![channel]);
    ensure!(registry.unregister(dead).is_none());
    Ok(())
}

#[rstest]
fn room_is_torn_down_with_its_last_member(registry: RoomRegistry) -> eyre::Result<()> {
    let channel = Channel::Task(TaskId::new());
    let (sender, mut inbox) = mpsc::unbounded_channel();
    let connection = registry.register(sender);

    registry.join(connection, channel)?;
    registry.deliver(message_on(channel), instant());
    ensure!(next_sequence(&mut inbox)? == 1);
    ensure!(registry.leave(connection, channel)?);
    ensure!(!registry.leave(connection, channel)?, "second leave is a no-op");
    ensure!(registry.room_count() == 0);

    registry.join(connection, channel)?;
    registry.deliver(message_on(channel), instant());
    ensure!(next_sequence(&mut inbox)? == 1, "a new room restarts numbering");
    Ok(())
}

#[rstest]
fn events_for_empty_channels_go_nowhere(registry: RoomRegistry) {
    let report = registry.deliver(message_on(Channel::User(UserId::new())), instant());
    assert_eq!(report, DeliveryReport::default());
}

#[rstest]
fn authentication_tracks_first_connection(registry: RoomRegistry) -> eyre::Result<()> {
    let user = UserId::new();
    let (sender_a, _inbox_a) = mpsc::unbounded_channel();
    let (sender_b, _inbox_b) = mpsc::unbounded_channel();
    let a = registry.register(sender_a);
    let b = registry.register(sender_b);

    ensure!(registry.authenticate(a, user)?);
    ensure!(!registry.authenticate(a, user)?, "re-authentication is idempotent");
    ensure!(!registry.authenticate(b, user)?);
    ensure!(registry.connection_count(user) == 2);
    ensure!(matches!(
        registry.authenticate(a, UserId::new()),
        Err(RealtimeError::IdentityMismatch)
    ));
    Ok(())
}

#[rstest]
fn unregister_reports_last_connection(registry: RoomRegistry) -> eyre::Result<()> {
    let user = UserId::new();
    let channel = Channel::User(user);
    let (sender_a, _inbox_a) = mpsc::unbounded_channel();
    let (sender_b, _inbox_b) = mpsc::unbounded_channel();
    let a = registry.register(sender_a);
    let b = registry.register(sender_b);
    registry.authenticate(a, user)?;
    registry.authenticate(b, user)?;
    registry.join(a, channel)?;

    let first = registry.unregister(a).ok_or_eyre("a was registered")?;
    ensure!(first.user == Some(user));
    ensure!(first.channels == vec![channel]);
    ensure!(!first.last_connection);

    let second = registry.unregister(b).ok_or_eyre("b was registered")?;
    ensure!(second.last_connection);
    ensure!(registry.unregister(b).is_none());
    ensure!(registry.room_count() == 0);
    Ok(())
}

#[rstest]
fn bus_stamps_events_with_clock_time() -> eyre::Result<()> {
    let registry = Arc::new(RoomRegistry::new());
    let clock = Arc::new(ManualClock::new(instant()));
    let bus = InMemoryEventBus::new(Arc::clone(&registry), Arc::clone(&clock));
    let channel = Channel::Task(TaskId::new());
    let (sender, mut inbox) = mpsc::unbounded_channel();
    let connection = registry.register(sender);
    registry.join(connection, channel)?;

    bus.publish(message_on(channel));

    let Ok(ServerFrame::Event(event)) = inbox.try_recv() else {
        bail!("the member should receive the event");
    };
    ensure!(event.occurred_at == instant());
    ensure!(event.channel == channel && event.event == EventKind::NewMessage);
    ensure!(event.payload == json!({ "content": "hi" }));
    Ok(())
}
