//! Task lifecycle engine: task creation, edits and status transitions.

use super::events::LifecycleEvents;
use crate::error::{Classify, ErrorKind};
use crate::marketplace::{
    domain::{
        Actor, BidId, BidStatus, Budget, MarketplaceDomainError, MarketplaceRules, Rating, Task,
        TaskCategory, TaskDraft, TaskId, TaskPatch, TaskStatus, TaskView, UserId, UserStats,
    },
    ports::{
        BidRepository, BidRepositoryError, CompletionTally, TaskRepository, TaskRepositoryError,
        TaskWriteGuard, UserStatsRepository, UserStatsRepositoryError,
    },
};
use crate::realtime::{domain::ConnectionId, ports::EventPublisher};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Authenticated user issuing a command, and the connection it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// Acting user.
    pub user: UserId,
    /// Live connection that triggered the command, excluded from echoes.
    pub origin: Option<ConnectionId>,
}

impl Caller {
    /// Creates a caller with no live connection.
    #[must_use]
    pub const fn new(user: UserId) -> Self {
        Self { user, origin: None }
    }

    /// Sets the originating connection.
    #[must_use]
    pub const fn via(mut self, connection: ConnectionId) -> Self {
        self.origin = Some(connection);
        self
    }

    pub(crate) const fn actor(self) -> Actor {
        Actor::User(self.user)
    }
}

impl From<UserId> for Caller {
    fn from(user: UserId) -> Self {
        Self::new(user)
    }
}

/// Request payload for posting a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    caller: Caller,
    title: String,
    description: String,
    category: String,
    budget_min: u32,
    budget_max: u32,
    deadline: DateTime<Utc>,
}

impl CreateTaskRequest {
    /// Creates a request with every required field.
    #[must_use]
    pub fn new(
        caller: impl Into<Caller>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        budget: (u32, u32),
        deadline: DateTime<Utc>,
    ) -> Self {
        let (budget_min, budget_max) = budget;
        Self {
            caller: caller.into(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            budget_min,
            budget_max,
            deadline,
        }
    }
}

/// Request payload for editing an open task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    task_id: TaskId,
    caller: Caller,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    budget: Option<(u32, u32)>,
    deadline: Option<DateTime<Utc>>,
}

impl UpdateTaskRequest {
    /// Creates an empty edit of `task_id`.
    #[must_use]
    pub fn new(task_id: TaskId, caller: impl Into<Caller>) -> Self {
        Self {
            task_id,
            caller: caller.into(),
            title: None,
            description: None,
            category: None,
            budget: None,
            deadline: None,
        }
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Replaces the budget range.
    #[must_use]
    pub const fn with_budget(mut self, min: u32, max: u32) -> Self {
        self.budget = Some((min, max));
        self
    }

    /// Replaces the deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Request payload for completing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteTaskRequest {
    task_id: TaskId,
    caller: Caller,
    rating: Option<u8>,
    review: Option<String>,
}

impl CompleteTaskRequest {
    /// Creates a completion without rating or review.
    #[must_use]
    pub fn new(task_id: TaskId, caller: impl Into<Caller>) -> Self {
        Self {
            task_id,
            caller: caller.into(),
            rating: None,
            review: None,
        }
    }

    /// Rates the assignee from 1 to 5.
    #[must_use]
    pub const fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Adds a written review. Requires a rating.
    #[must_use]
    pub fn with_review(mut self, review: impl Into<String>) -> Self {
        self.review = Some(review.into());
        self
    }
}

/// Service-level errors for task and bid operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] MarketplaceDomainError),
    /// Task repository operation failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),
    /// Bid repository operation failed.
    #[error(transparent)]
    BidRepository(#[from] BidRepositoryError),
    /// Statistics repository operation failed.
    #[error(transparent)]
    StatsRepository(#[from] UserStatsRepositoryError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The bid does not exist.
    #[error("bid not found: {0}")]
    BidNotFound(BidId),
    /// The bid belongs to another task.
    #[error("bid {bid_id} does not belong to task {task_id}")]
    BidTaskMismatch {
        /// Bid identifier.
        bid_id: BidId,
        /// Task identifier.
        task_id: TaskId,
    },
    /// The caller may not perform the action.
    #[error("user {user} may not {action}")]
    AccessDenied {
        /// Acting user.
        user: UserId,
        /// Attempted action.
        action: &'static str,
    },
    /// The task is not open or its deadline has passed.
    #[error("task {0} is not accepting bids")]
    NotAcceptingBids(TaskId),
    /// The poster tried to bid on their own task.
    #[error("users cannot bid on their own task")]
    SelfBidding,
    /// The bidder already holds a non-withdrawn bid on the task.
    #[error("bidder {bidder} already has an active bid on task {task_id}")]
    DuplicateBid {
        /// Task identifier.
        task_id: TaskId,
        /// Bidder identifier.
        bidder: UserId,
    },
    /// The amount lies outside the task's current budget.
    #[error("amount {amount} is outside the task budget {budget}")]
    BudgetOutOfRange {
        /// Offered amount.
        amount: u32,
        /// Current task budget.
        budget: Budget,
    },
    /// Another decision on the task's bids already committed.
    #[error("a bid on task {0} has already been decided")]
    AlreadyDecided(TaskId),
    /// The task changed between load and write.
    #[error("task {0} was modified concurrently")]
    ConcurrentModification(TaskId),
    /// Only rejected or withdrawn bids may be deleted.
    #[error("bid {0} cannot be deleted in its current status")]
    BidNotDeletable(BidId),
}

impl Classify for TaskLifecycleError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(
                MarketplaceDomainError::InvalidTaskTransition { .. }
                | MarketplaceDomainError::InvalidBidTransition { .. }
                | MarketplaceDomainError::TaskLocked(_),
            )
            | Self::ConcurrentModification(_)
            | Self::BidNotDeletable(_) => ErrorKind::InvalidTransition,
            Self::Domain(_) | Self::BidTaskMismatch { .. } => ErrorKind::Validation,
            Self::TaskRepository(TaskRepositoryError::NotFound(_))
            | Self::BidRepository(BidRepositoryError::NotFound(_))
            | Self::TaskNotFound(_)
            | Self::BidNotFound(_) => ErrorKind::NotFound,
            Self::TaskRepository(_) | Self::BidRepository(_) | Self::StatsRepository(_) => {
                ErrorKind::Internal
            }
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::NotAcceptingBids(_) => ErrorKind::NotAcceptingBids,
            Self::SelfBidding => ErrorKind::SelfBidding,
            Self::DuplicateBid { .. } => ErrorKind::DuplicateBid,
            Self::BudgetOutOfRange { .. } => ErrorKind::BudgetOutOfRange,
            Self::AlreadyDecided(_) => ErrorKind::AlreadyDecided,
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
///
/// Every bid mutation performed here is followed by a recount of the task's
/// live bids, which is the only writer of the cached bid count.
#[derive(Clone)]
pub struct TaskLifecycleService<T, B, U, C>
where
    T: TaskRepository,
    B: BidRepository,
    U: UserStatsRepository,
    C: Clock + Send + Sync,
{
    pub(super) tasks: Arc<T>,
    pub(super) bids: Arc<B>,
    pub(super) stats: Arc<U>,
    pub(super) clock: Arc<C>,
    pub(super) events: LifecycleEvents,
    pub(super) rules: MarketplaceRules,
}

impl<T, B, U, C> TaskLifecycleService<T, B, U, C>
where
    T: TaskRepository,
    B: BidRepository,
    U: UserStatsRepository,
    C: Clock + Send + Sync,
{
    /// Creates a service with default marketplace rules.
    #[must_use]
    pub fn new(
        tasks: Arc<T>,
        bids: Arc<B>,
        stats: Arc<U>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tasks,
            bids,
            stats,
            clock,
            events: LifecycleEvents::new(publisher),
            rules: MarketplaceRules::default(),
        }
    }

    /// Replaces the marketplace rules.
    #[must_use]
    pub const fn with_rules(mut self, rules: MarketplaceRules) -> Self {
        self.rules = rules;
        self
    }

    /// Returns the active marketplace rules.
    #[must_use]
    pub const fn rules(&self) -> &MarketplaceRules {
        &self.rules
    }

    /// Posts a new open task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for invalid fields or a
    /// deadline that is not in the future.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<TaskView> {
        let draft = TaskDraft {
            title: request.title,
            description: request.description,
            category: TaskCategory::try_from(request.category.as_str())?,
            budget: Budget::new(
                request.budget_min,
                request.budget_max,
                self.rules.budget_bounds,
            )?,
            deadline: request.deadline,
        };
        let task = Task::new(request.caller.user, draft, &self.rules, &*self.clock)?;
        self.tasks.store(&task).await?;
        if let Err(error) = self.stats.record_posted(task.poster()).await {
            warn!(task_id = %task.id(), %error, "failed to record posted task");
        }
        info!(task_id = %task.id(), poster = %task.poster(), "task created");
        Ok(self.view(task))
    }

    /// Finds a task, deriving urgency from the current time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskRepository`] when the lookup fails.
    pub async fn find_task(&self, task_id: TaskId) -> TaskLifecycleResult<Option<TaskView>> {
        let task = self.tasks.find_by_id(task_id).await?;
        Ok(task.map(|found| self.view(found)))
    }

    /// Lists open tasks, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskRepository`] when the lookup fails.
    pub async fn list_open_tasks(
        &self,
        category: Option<TaskCategory>,
    ) -> TaskLifecycleResult<Vec<TaskView>> {
        let tasks = self.tasks.list_by_status(TaskStatus::Open, category).await?;
        Ok(tasks.into_iter().map(|task| self.view(task)).collect())
    }

    /// Lists tasks the user posted or is assigned to.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskRepository`] when the lookup fails.
    pub async fn tasks_for(&self, user: UserId) -> TaskLifecycleResult<Vec<TaskView>> {
        let tasks = self.tasks.find_by_participant(user).await?;
        Ok(tasks.into_iter().map(|task| self.view(task)).collect())
    }

    /// Edits an open task that has no live bids.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::AccessDenied`] for anyone but the
    /// poster and [`MarketplaceDomainError::TaskLocked`] once bidding began.
    pub async fn update_task(&self, request: UpdateTaskRequest) -> TaskLifecycleResult<TaskView> {
        let mut task = self.load_task(request.task_id).await?;
        require_poster(&task, request.caller.user, "edit this task")?;
        let patch = TaskPatch {
            title: request.title,
            description: request.description,
            category: request
                .category
                .as_deref()
                .map(TaskCategory::try_from)
                .transpose()?,
            budget: request
                .budget
                .map(|(min, max)| Budget::new(min, max, self.rules.budget_bounds))
                .transpose()?,
            deadline: request.deadline,
        };
        task.apply_patch(patch, &self.rules, &*self.clock)?;
        if !self.tasks.update_if(&task, TaskWriteGuard::editable()).await? {
            return Err(MarketplaceDomainError::TaskLocked(task.id()).into());
        }
        info!(task_id = %task.id(), "task updated");
        Ok(self.view(task))
    }

    /// Deletes an open task that has no live bids.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::AccessDenied`] for anyone but the
    /// poster and [`MarketplaceDomainError::TaskLocked`] once bidding began.
    pub async fn delete_task(
        &self,
        task_id: TaskId,
        caller: impl Into<Caller>,
    ) -> TaskLifecycleResult<()> {
        let caller = caller.into();
        let task = self.load_task(task_id).await?;
        require_poster(&task, caller.user, "delete this task")?;
        if !task.is_editable() || !self.tasks.delete_if(task_id, TaskWriteGuard::editable()).await?
        {
            return Err(MarketplaceDomainError::TaskLocked(task_id).into());
        }
        self.bids.delete_by_task(task_id).await?;
        info!(%task_id, "task deleted");
        Ok(())
    }

    /// Moves an assigned task into progress. Assignee only.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::AccessDenied`] for anyone but the
    /// assignee and an invalid-transition error unless the task is assigned.
    pub async fn start_task(
        &self,
        task_id: TaskId,
        caller: impl Into<Caller>,
    ) -> TaskLifecycleResult<Task> {
        let caller = caller.into();
        let mut task = self.load_task(task_id).await?;
        if task.assigned_to() != Some(caller.user) {
            return Err(TaskLifecycleError::AccessDenied {
                user: caller.user,
                action: "start this task",
            });
        }
        let from = task.status();
        task.start(&*self.clock)?;
        self.commit_transition(&task, from).await?;
        self.events
            .task_status_changed(&task, from, caller.actor(), caller.origin);
        Ok(task)
    }

    /// Completes a task in progress and updates both parties' counters.
    /// Poster only.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::AccessDenied`] for anyone but the
    /// poster, a validation error for a bad rating, and an invalid-transition
    /// error unless the task is in progress.
    pub async fn complete_task(&self, request: CompleteTaskRequest) -> TaskLifecycleResult<Task> {
        let caller = request.caller;
        let mut task = self.load_task(request.task_id).await?;
        require_poster(&task, caller.user, "complete this task")?;
        let rating = request.rating.map(Rating::new).transpose()?;
        let from = task.status();
        task.complete(rating, request.review, &*self.clock)?;
        self.commit_transition(&task, from).await?;

        if let (Some(assignee), Some(amount)) = (task.assigned_to(), task.agreed_amount()) {
            let tally = CompletionTally {
                poster: task.poster(),
                assignee,
                amount,
                rating,
            };
            if let Err(error) = self.stats.record_completion(tally).await {
                warn!(task_id = %task.id(), %error, "failed to record task completion");
            }
        }
        self.events
            .task_status_changed(&task, from, caller.actor(), caller.origin);
        Ok(task)
    }

    /// Closes a task and rejects every bid still pending on it. Poster only.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::AccessDenied`] for anyone but the
    /// poster and an invalid-transition error from a terminal status.
    pub async fn close_task(
        &self,
        task_id: TaskId,
        caller: impl Into<Caller>,
    ) -> TaskLifecycleResult<Task> {
        let caller = caller.into();
        let mut task = self.load_task(task_id).await?;
        require_poster(&task, caller.user, "close this task")?;
        let from = task.status();
        task.close(&*self.clock)?;
        self.commit_transition(&task, from).await?;

        let rejected = self
            .bids
            .reject_pending(task_id, None, self.clock.utc())
            .await?;
        let count = self.recount(task_id).await?;
        task.set_bid_count(count);

        self.events
            .task_status_changed(&task, from, caller.actor(), caller.origin);
        for bid in &rejected {
            self.events
                .bid_transition(&task, bid, BidStatus::Pending, caller.actor(), caller.origin);
        }
        info!(%task_id, rejected = rejected.len(), "task closed");
        Ok(task)
    }

    /// Returns the aggregate counters of `user`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::StatsRepository`] when the lookup fails.
    pub async fn user_stats(&self, user: UserId) -> TaskLifecycleResult<UserStats> {
        Ok(self.stats.find(user).await?)
    }

    pub(super) fn view(&self, task: Task) -> TaskView {
        TaskView::at(task, self.clock.utc(), &self.rules)
    }

    pub(super) async fn load_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::TaskNotFound(task_id))
    }

    pub(super) async fn recount(&self, task_id: TaskId) -> TaskLifecycleResult<u32> {
        let count = self.bids.count_live(task_id).await?;
        self.tasks.set_bid_count(task_id, count).await?;
        debug!(%task_id, bid_count = count, "bid count recomputed");
        Ok(count)
    }

    async fn commit_transition(&self, task: &Task, from: TaskStatus) -> TaskLifecycleResult<()> {
        if !self.tasks.update_if(task, TaskWriteGuard::status(from)).await? {
            return Err(TaskLifecycleError::ConcurrentModification(task.id()));
        }
        info!(task_id = %task.id(), %from, to = %task.status(), "task transitioned");
        Ok(())
    }
}

pub(super) fn require_poster(
    task: &Task,
    user: UserId,
    action: &'static str,
) -> TaskLifecycleResult<()> {
    if task.poster() != user {
        return Err(TaskLifecycleError::AccessDenied { user, action });
    }
    Ok(())
}
