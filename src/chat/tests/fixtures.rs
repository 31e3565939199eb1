//! Shared fixtures for chat tests.

use crate::chat::{
    adapters::memory::{InMemoryAttachmentStore, InMemoryChatMessageRepository},
    domain::Attachment,
    ports::AttachmentStore,
    services::ChatService,
};
use crate::clock::ManualClock;
use crate::marketplace::{
    adapters::memory::InMemoryTaskRepository,
    domain::{
        Bid, BidDraft, Budget, BudgetBounds, MarketplaceRules, Task, TaskCategory, TaskDraft,
        TaskId, UserId,
    },
    ports::TaskRepository,
};
use crate::realtime::adapters::RecordingEventPublisher;
use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::Clock;
use std::sync::Arc;

pub(super) type TestChat<A> =
    ChatService<InMemoryTaskRepository, InMemoryChatMessageRepository, A, ManualClock>;

pub(super) fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 11, 14, 30, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub(super) fn attachment(key: &str) -> Attachment {
    Attachment {
        storage_key: key.to_owned(),
        file_name: format!("{key}.png"),
        content_type: "image/png".to_owned(),
        size_bytes: 2048,
    }
}

/// A task between a poster and a helper, with a chat service over it.
pub(super) struct Conversation<A>
where
    A: AttachmentStore,
{
    pub(super) chat: TestChat<A>,
    pub(super) clock: ManualClock,
    pub(super) events: RecordingEventPublisher,
    pub(super) tasks: Arc<InMemoryTaskRepository>,
    pub(super) task_id: TaskId,
    pub(super) poster: UserId,
    pub(super) helper: UserId,
}

impl Conversation<InMemoryAttachmentStore> {
    pub(super) async fn assigned() -> eyre::Result<Self> {
        Self::with_store(InMemoryAttachmentStore::new(), true).await
    }

    pub(super) async fn unassigned() -> eyre::Result<Self> {
        Self::with_store(InMemoryAttachmentStore::new(), false).await
    }
}

impl<A> Conversation<A>
where
    A: AttachmentStore,
{
    pub(super) async fn with_store(attachments: A, assigned: bool) -> eyre::Result<Self> {
        let clock = ManualClock::new(start_instant());
        let events = RecordingEventPublisher::new();
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let poster = UserId::new();
        let helper = UserId::new();
        let task = conversation_task(poster, assigned.then_some(helper), &clock)?;
        tasks.store(&task).await?;
        let chat = ChatService::new(
            Arc::clone(&tasks),
            Arc::new(InMemoryChatMessageRepository::new()),
            Arc::new(attachments),
            Arc::new(events.clone()),
            Arc::new(clock.clone()),
        );
        Ok(Self {
            chat,
            clock,
            events,
            tasks,
            task_id: task.id(),
            poster,
            helper,
        })
    }

    pub(super) fn minutes_pass(&self, minutes: i64) {
        self.clock.advance(Duration::minutes(minutes));
    }
}

pub(super) fn conversation_task(
    poster: UserId,
    helper: Option<UserId>,
    clock: &ManualClock,
) -> eyre::Result<Task> {
    let rules = MarketplaceRules::default();
    let draft = TaskDraft {
        title: "Walk my dog".to_owned(),
        description: "Thirty minutes around the quad, twice a day.".to_owned(),
        category: TaskCategory::Errands,
        budget: Budget::new(50, 100, BudgetBounds::PLATFORM)?,
        deadline: clock.utc() + Duration::days(4),
    };
    let mut task = Task::new(poster, draft, &rules, clock)?;
    if let Some(assignee) = helper {
        let offer = BidDraft {
            amount: 70,
            proposed_timeline: "starting Monday".to_owned(),
            cover_note: None,
            highlighted: false,
        };
        let mut bid = Bid::new(task.id(), assignee, offer, &rules, clock)?;
        bid.accept(clock)?;
        task.assign(&bid, clock)?;
    }
    Ok(task)
}
