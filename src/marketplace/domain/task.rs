//! Task aggregate root and its lifecycle state machine.

use super::{
    Bid, BidId, Budget, MarketplaceDomainError, MarketplaceRules, ParseTaskStatusError, Rating,
    TaskCategory, TaskId, UserId,
};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
///
/// `Open -> Assigned -> InProgress -> Completed`, with `Closed` reachable
/// from every non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepting bids.
    Open,
    /// A bid has been accepted; work has not started.
    Assigned,
    /// The assignee has started work.
    InProgress,
    /// Work was completed. Terminal.
    Completed,
    /// The poster closed the task. Terminal.
    Closed,
}

impl TaskStatus {
    /// Every status in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::Assigned,
        Self::InProgress,
        Self::Completed,
        Self::Closed,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Closed => "closed",
        }
    }

    /// Returns `true` for statuses with no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Closed)
    }

    /// Returns `true` when the state machine permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Assigned)
                | (Self::Assigned, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::Open | Self::Assigned | Self::InProgress, Self::Closed)
        )
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseTaskStatusError(value.to_owned()))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated input for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Task category.
    pub category: TaskCategory,
    /// Offered budget range.
    pub budget: Budget,
    /// Completion deadline.
    pub deadline: DateTime<Utc>,
}

/// Partial update to an open task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement category.
    pub category: Option<TaskCategory>,
    /// Replacement budget.
    pub budget: Option<Budget>,
    /// Replacement deadline.
    pub deadline: Option<DateTime<Utc>>,
}

/// Outcome recorded when a task completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// When the poster marked the task complete.
    pub completed_at: DateTime<Utc>,
    /// Rating given to the assignee.
    pub rating: Option<Rating>,
    /// Review text given to the assignee.
    pub review: Option<String>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    category: TaskCategory,
    budget: Budget,
    deadline: DateTime<Utc>,
    status: TaskStatus,
    poster: UserId,
    assigned_to: Option<UserId>,
    accepted_bid: Option<BidId>,
    agreed_amount: Option<u32>,
    bid_count: u32,
    completion: Option<CompletionRecord>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates an open task owned by `poster`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError`] when the title or description is
    /// empty or too long, or when the deadline is not strictly in the future.
    pub fn new(
        poster: UserId,
        draft: TaskDraft,
        rules: &MarketplaceRules,
        clock: &impl Clock,
    ) -> Result<Self, MarketplaceDomainError> {
        let now = clock.utc();
        let title = validate_title(&draft.title, rules)?;
        let description = validate_description(&draft.description, rules)?;
        ensure_future(draft.deadline, now)?;

        Ok(Self {
            id: TaskId::new(),
            title,
            description,
            category: draft.category,
            budget: draft.budget,
            deadline: draft.deadline,
            status: TaskStatus::Open,
            poster,
            assigned_to: None,
            accepted_bid: None,
            agreed_amount: None,
            bid_count: 0,
            completion: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the category.
    #[must_use]
    pub const fn category(&self) -> TaskCategory {
        self.category
    }

    /// Returns the budget range.
    #[must_use]
    pub const fn budget(&self) -> Budget {
        self.budget
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the poster.
    #[must_use]
    pub const fn poster(&self) -> UserId {
        self.poster
    }

    /// Returns the assignee, once a bid has been accepted.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    /// Returns the accepted bid, if any.
    #[must_use]
    pub const fn accepted_bid(&self) -> Option<BidId> {
        self.accepted_bid
    }

    /// Returns the amount of the accepted bid, if any.
    #[must_use]
    pub const fn agreed_amount(&self) -> Option<u32> {
        self.agreed_amount
    }

    /// Returns the cached count of pending and accepted bids.
    #[must_use]
    pub const fn bid_count(&self) -> u32 {
        self.bid_count
    }

    /// Returns the completion record once completed.
    #[must_use]
    pub const fn completion(&self) -> Option<&CompletionRecord> {
        self.completion.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when `0 < deadline - now <= window`.
    #[must_use]
    pub fn is_urgent(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let remaining = self.deadline - now;
        remaining > Duration::zero() && remaining <= window
    }

    /// Returns `true` while the task is open and its deadline has not passed.
    #[must_use]
    pub fn accepting_bids(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Open && self.deadline > now
    }

    /// Returns `true` when the task may still be edited or deleted.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self.status, TaskStatus::Open) && self.bid_count == 0
    }

    /// Returns `true` when `user` is the poster or the assignee.
    #[must_use]
    pub fn is_participant(&self, user: UserId) -> bool {
        self.poster == user || self.assigned_to == Some(user)
    }

    /// Returns the other party of the poster/assignee pair.
    ///
    /// `None` when `user` is not a participant or no one is assigned yet.
    #[must_use]
    pub fn counterparty_of(&self, user: UserId) -> Option<UserId> {
        if user == self.poster {
            self.assigned_to
        } else if self.assigned_to == Some(user) {
            Some(self.poster)
        } else {
            None
        }
    }

    /// Replaces the cached bid count with a freshly recomputed value.
    pub const fn set_bid_count(&mut self, count: u32) {
        self.bid_count = count;
    }

    /// Applies an edit while the task is open and has no live bids.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::TaskLocked`] once bidding has
    /// started or the task has left `Open`, and validation errors for the
    /// replacement values.
    pub fn apply_patch(
        &mut self,
        patch: TaskPatch,
        rules: &MarketplaceRules,
        clock: &impl Clock,
    ) -> Result<(), MarketplaceDomainError> {
        if !self.is_editable() {
            return Err(MarketplaceDomainError::TaskLocked(self.id));
        }
        let title = patch
            .title
            .map(|title| validate_title(&title, rules))
            .transpose()?;
        let description = patch
            .description
            .map(|description| validate_description(&description, rules))
            .transpose()?;
        if let Some(deadline) = patch.deadline {
            ensure_future(deadline, clock.utc())?;
            self.deadline = deadline;
        }
        if let Some(value) = title {
            self.title = value;
        }
        if let Some(value) = description {
            self.description = value;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(budget) = patch.budget {
            self.budget = budget;
        }
        self.touch(clock);
        Ok(())
    }

    /// Assigns the task to the bidder of an accepted bid.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidTaskTransition`] unless the
    /// task is `Open`.
    pub fn assign(&mut self, bid: &Bid, clock: &impl Clock) -> Result<(), MarketplaceDomainError> {
        self.transition_to(TaskStatus::Assigned, clock)?;
        self.assigned_to = Some(bid.bidder());
        self.accepted_bid = Some(bid.id());
        self.agreed_amount = Some(bid.amount());
        Ok(())
    }

    /// Marks work as started.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidTaskTransition`] unless the
    /// task is `Assigned`.
    pub fn start(&mut self, clock: &impl Clock) -> Result<(), MarketplaceDomainError> {
        self.transition_to(TaskStatus::InProgress, clock)
    }

    /// Marks the task completed and records the optional rating and review.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::ReviewWithoutRating`] when a review
    /// lacks a rating, or [`MarketplaceDomainError::InvalidTaskTransition`]
    /// unless the task is `InProgress`.
    pub fn complete(
        &mut self,
        rating: Option<Rating>,
        review: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), MarketplaceDomainError> {
        let review = review
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());
        if review.is_some() && rating.is_none() {
            return Err(MarketplaceDomainError::ReviewWithoutRating);
        }
        self.transition_to(TaskStatus::Completed, clock)?;
        self.completion = Some(CompletionRecord {
            completed_at: self.updated_at,
            rating,
            review,
        });
        Ok(())
    }

    /// Closes the task.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidTaskTransition`] from a
    /// terminal status.
    pub fn close(&mut self, clock: &impl Clock) -> Result<(), MarketplaceDomainError> {
        self.transition_to(TaskStatus::Closed, clock)
    }

    fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), MarketplaceDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(MarketplaceDomainError::InvalidTaskTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// Read model of a task with fields derived from the current time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    /// Stored task.
    #[serde(flatten)]
    pub task: Task,
    /// Whether the deadline falls within the urgency window.
    pub is_urgent: bool,
    /// Whether the task currently accepts bids.
    pub accepting_bids: bool,
}

impl TaskView {
    /// Derives the read model at `now`.
    #[must_use]
    pub fn at(task: Task, now: DateTime<Utc>, rules: &MarketplaceRules) -> Self {
        let is_urgent = task.is_urgent(now, rules.urgency_window);
        let accepting_bids = task.accepting_bids(now);
        Self {
            task,
            is_urgent,
            accepting_bids,
        }
    }
}

fn validate_title(raw: &str, rules: &MarketplaceRules) -> Result<String, MarketplaceDomainError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(MarketplaceDomainError::EmptyTitle);
    }
    if title.chars().count() > rules.max_title_length {
        return Err(MarketplaceDomainError::TitleTooLong {
            max: rules.max_title_length,
        });
    }
    Ok(title.to_owned())
}

fn validate_description(
    raw: &str,
    rules: &MarketplaceRules,
) -> Result<String, MarketplaceDomainError> {
    let description = raw.trim();
    if description.is_empty() {
        return Err(MarketplaceDomainError::EmptyDescription);
    }
    if description.chars().count() > rules.max_description_length {
        return Err(MarketplaceDomainError::DescriptionTooLong {
            max: rules.max_description_length,
        });
    }
    Ok(description.to_owned())
}

const fn ensure_future(
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), MarketplaceDomainError> {
    if deadline.timestamp_micros() <= now.timestamp_micros() {
        return Err(MarketplaceDomainError::DeadlineNotInFuture);
    }
    Ok(())
}
