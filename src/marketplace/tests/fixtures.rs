//! Shared fixtures for marketplace tests.

use crate::clock::ManualClock;
use crate::marketplace::{
    adapters::memory::{InMemoryBidRepository, InMemoryTaskRepository, InMemoryUserStatsRepository},
    domain::{Bid, TaskId, TaskView, UserId},
    services::{BidExpiryScheduler, CreateTaskRequest, PlaceBidRequest, TaskLifecycleService},
};
use crate::realtime::adapters::RecordingEventPublisher;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::fixture;
use std::sync::Arc;

pub(super) type TestService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryBidRepository,
    InMemoryUserStatsRepository,
    ManualClock,
>;

pub(super) type TestScheduler = BidExpiryScheduler<
    InMemoryTaskRepository,
    InMemoryBidRepository,
    InMemoryUserStatsRepository,
    ManualClock,
>;

pub(super) fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Service wired to in-memory stores, a pinned clock and a recording bus.
pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) clock: ManualClock,
    pub(super) events: RecordingEventPublisher,
    pub(super) tasks: Arc<InMemoryTaskRepository>,
    pub(super) bids: Arc<InMemoryBidRepository>,
    pub(super) poster: UserId,
}

impl Harness {
    pub(super) async fn open_task(&self, budget: (u32, u32)) -> TaskView {
        let request = CreateTaskRequest::new(
            self.poster,
            "Move a sofa to the third floor",
            "Two flights of stairs, no lift. Sofa is about 2m long.",
            "moving",
            budget,
            self.clock_now() + Duration::days(3),
        );
        self.service
            .create_task(request)
            .await
            .expect("task creation should succeed")
    }

    pub(super) async fn bid(&self, task_id: TaskId, bidder: UserId, amount: u32) -> Bid {
        self.service
            .place_bid(PlaceBidRequest::new(task_id, bidder, amount, "this weekend"))
            .await
            .expect("bid placement should succeed")
    }

    pub(super) fn clock_now(&self) -> DateTime<Utc> {
        mockable::Clock::utc(&self.clock)
    }
}

#[fixture]
pub(super) fn harness() -> Harness {
    let clock = ManualClock::new(start_instant());
    let events = RecordingEventPublisher::new();
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let bids = Arc::new(InMemoryBidRepository::new());
    let service = TaskLifecycleService::new(
        Arc::clone(&tasks),
        Arc::clone(&bids),
        Arc::new(InMemoryUserStatsRepository::new()),
        Arc::new(events.clone()),
        Arc::new(clock.clone()),
    );
    Harness {
        service: Arc::new(service),
        clock,
        events,
        tasks,
        bids,
        poster: UserId::new(),
    }
}
