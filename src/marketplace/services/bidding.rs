//! Bid operations of the task lifecycle engine.

use super::lifecycle::{
    Caller, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService, require_poster,
};
use crate::marketplace::{
    domain::{Actor, Bid, BidDraft, BidId, BidStatus, Task, TaskId, TaskStatus, UserId},
    ports::{BidRepository, BidRepositoryError, TaskRepository, TaskWriteGuard, UserStatsRepository},
};
use crate::realtime::domain::ConnectionId;
use mockable::Clock;
use tracing::{info, warn};

/// Request payload for placing a bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceBidRequest {
    task_id: TaskId,
    caller: Caller,
    amount: u32,
    proposed_timeline: String,
    cover_note: Option<String>,
    highlighted: bool,
}

impl PlaceBidRequest {
    /// Creates a bid request with the required fields.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        caller: impl Into<Caller>,
        amount: u32,
        proposed_timeline: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            caller: caller.into(),
            amount,
            proposed_timeline: proposed_timeline.into(),
            cover_note: None,
            highlighted: false,
        }
    }

    /// Adds a note to the poster.
    #[must_use]
    pub fn with_cover_note(mut self, note: impl Into<String>) -> Self {
        self.cover_note = Some(note.into());
        self
    }

    /// Marks the bid as highlighted.
    #[must_use]
    pub const fn highlighted(mut self) -> Self {
        self.highlighted = true;
        self
    }
}

/// Outcome of a successful acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedBid {
    /// The task, now assigned.
    pub task: Task,
    /// The accepted bid.
    pub bid: Bid,
    /// Bids rejected by the cascade.
    pub rejected: Vec<Bid>,
}

impl<T, B, U, C> TaskLifecycleService<T, B, U, C>
where
    T: TaskRepository,
    B: BidRepository,
    U: UserStatsRepository,
    C: Clock + Send + Sync,
{
    /// Places a pending bid on an open task and notifies the poster.
    ///
    /// # Errors
    ///
    /// Checked in order: [`TaskLifecycleError::NotAcceptingBids`],
    /// [`TaskLifecycleError::SelfBidding`], [`TaskLifecycleError::DuplicateBid`]
    /// and [`TaskLifecycleError::BudgetOutOfRange`]; validation errors for
    /// the timeline.
    pub async fn place_bid(&self, request: PlaceBidRequest) -> TaskLifecycleResult<Bid> {
        let bidder = request.caller.user;
        let task = self.load_task(request.task_id).await?;
        if !task.accepting_bids(self.clock.utc()) {
            return Err(TaskLifecycleError::NotAcceptingBids(task.id()));
        }
        if task.poster() == bidder {
            return Err(TaskLifecycleError::SelfBidding);
        }
        let existing = self.bids.find_by_task(task.id()).await?;
        if existing
            .iter()
            .any(|bid| bid.bidder() == bidder && bid.status().blocks_rebid())
        {
            return Err(TaskLifecycleError::DuplicateBid {
                task_id: task.id(),
                bidder,
            });
        }
        if !task.budget().contains(request.amount) {
            return Err(TaskLifecycleError::BudgetOutOfRange {
                amount: request.amount,
                budget: task.budget(),
            });
        }

        let draft = BidDraft {
            amount: request.amount,
            proposed_timeline: request.proposed_timeline,
            cover_note: request.cover_note,
            highlighted: request.highlighted,
        };
        let mut bid = Bid::new(task.id(), bidder, draft, &self.rules, &*self.clock)?;
        self.bids.store(&bid).await.map_err(|error| match error {
            BidRepositoryError::DuplicateActiveBid { task_id, bidder } => {
                TaskLifecycleError::DuplicateBid { task_id, bidder }
            }
            other => other.into(),
        })?;

        // Counting the stored bid first locks the task against edits; the
        // reload then sees any edit that committed before the lock.
        let count = self.recount(task.id()).await?;
        let mut current = self.load_task(task.id()).await?;
        if current.status() != TaskStatus::Open {
            self.roll_back_bid(&mut bid).await?;
            return Err(TaskLifecycleError::NotAcceptingBids(task.id()));
        }
        if !current.budget().contains(bid.amount()) {
            self.roll_back_bid(&mut bid).await?;
            return Err(TaskLifecycleError::BudgetOutOfRange {
                amount: bid.amount(),
                budget: current.budget(),
            });
        }

        current.set_bid_count(count);
        info!(task_id = %current.id(), bid_id = %bid.id(), amount = bid.amount(), "bid placed");
        self.events.new_bid(&current, &bid);
        Ok(bid)
    }

    /// Accepts one pending bid, assigns the task to its bidder and rejects
    /// every other pending bid. Poster only.
    ///
    /// The bid write is guarded on its pending status; when a concurrent
    /// acceptance wins, this call fails with
    /// [`TaskLifecycleError::AlreadyDecided`] and no cascade runs.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::AlreadyDecided`] when a decision already
    /// committed, [`TaskLifecycleError::NotAcceptingBids`] when the task is
    /// closed or past its deadline, and [`TaskLifecycleError::AccessDenied`]
    /// for anyone but the poster.
    pub async fn accept_bid(
        &self,
        task_id: TaskId,
        bid_id: BidId,
        caller: impl Into<Caller>,
    ) -> TaskLifecycleResult<AcceptedBid> {
        let caller = caller.into();
        let now = self.clock.utc();
        let mut task = self.load_task(task_id).await?;
        require_poster(&task, caller.user, "accept bids on this task")?;
        let mut bid = self.load_bid_on(task_id, bid_id).await?;

        match task.status() {
            TaskStatus::Open if task.accepting_bids(now) => {}
            TaskStatus::Assigned | TaskStatus::InProgress | TaskStatus::Completed => {
                return Err(TaskLifecycleError::AlreadyDecided(task_id));
            }
            TaskStatus::Open | TaskStatus::Closed => {
                return Err(TaskLifecycleError::NotAcceptingBids(task_id));
            }
        }
        if matches!(bid.status(), BidStatus::Accepted | BidStatus::Rejected) {
            return Err(TaskLifecycleError::AlreadyDecided(task_id));
        }

        bid.accept(&*self.clock)?;
        if !self.bids.accept_if_pending(&bid).await? {
            warn!(%task_id, %bid_id, "bid acceptance lost a race");
            return Err(TaskLifecycleError::AlreadyDecided(task_id));
        }

        task.assign(&bid, &*self.clock)?;
        if !self
            .tasks
            .update_if(&task, TaskWriteGuard::status(TaskStatus::Open))
            .await?
        {
            warn!(%task_id, %bid_id, "task left open during acceptance; rescinding");
            bid.rescind_at(self.clock.utc())?;
            self.bids.transition_if(&bid, BidStatus::Accepted).await?;
            self.recount(task_id).await?;
            return Err(TaskLifecycleError::NotAcceptingBids(task_id));
        }

        let rejected = self
            .bids
            .reject_pending(task_id, Some(bid_id), self.clock.utc())
            .await?;
        let count = self.recount(task_id).await?;
        task.set_bid_count(count);

        self.events
            .bid_transition(&task, &bid, BidStatus::Pending, caller.actor(), caller.origin);
        self.events
            .task_status_changed(&task, TaskStatus::Open, caller.actor(), caller.origin);
        for other in &rejected {
            self.events
                .bid_transition(&task, other, BidStatus::Pending, caller.actor(), caller.origin);
        }
        info!(
            %task_id,
            %bid_id,
            assignee = %bid.bidder(),
            rejected = rejected.len(),
            "bid accepted"
        );
        Ok(AcceptedBid {
            task,
            bid,
            rejected,
        })
    }

    /// Rejects one pending bid. Poster only.
    ///
    /// # Errors
    ///
    /// Returns an invalid-transition error unless the bid is pending, and
    /// [`TaskLifecycleError::AccessDenied`] for anyone but the poster.
    pub async fn reject_bid(
        &self,
        task_id: TaskId,
        bid_id: BidId,
        caller: impl Into<Caller>,
    ) -> TaskLifecycleResult<Bid> {
        let caller = caller.into();
        let task = self.load_task(task_id).await?;
        require_poster(&task, caller.user, "reject bids on this task")?;
        let mut bid = self.load_bid_on(task_id, bid_id).await?;
        bid.reject(&*self.clock)?;
        self.decide(task, bid, caller.actor(), caller.origin).await
    }

    /// Withdraws the caller's pending bid.
    ///
    /// # Errors
    ///
    /// Returns an invalid-transition error unless the bid is pending, and
    /// [`TaskLifecycleError::AccessDenied`] for anyone but the bidder.
    pub async fn withdraw_bid(
        &self,
        bid_id: BidId,
        caller: impl Into<Caller>,
    ) -> TaskLifecycleResult<Bid> {
        let caller = caller.into();
        let mut bid = self.load_bid(bid_id).await?;
        require_bidder(&bid, caller.user, "withdraw this bid")?;
        let task = self.load_task(bid.task_id()).await?;
        bid.withdraw(&*self.clock)?;
        self.decide(task, bid, caller.actor(), caller.origin).await
    }

    /// Withdraws a pending bid whose auto-withdraw time has passed.
    ///
    /// Returns `None` when the bid is no longer pending or not yet due.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the store cannot be read or
    /// written.
    pub async fn expire_bid(&self, bid_id: BidId) -> TaskLifecycleResult<Option<Bid>> {
        let mut bid = self.load_bid(bid_id).await?;
        if !bid.is_expired(self.clock.utc()) {
            return Ok(None);
        }
        let task = self.load_task(bid.task_id()).await?;
        bid.withdraw(&*self.clock)?;
        match self.decide(task, bid, Actor::System, None).await {
            Ok(bid) => Ok(Some(bid)),
            Err(TaskLifecycleError::AlreadyDecided(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Returns pending bids due for auto-withdrawal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::BidRepository`] when the lookup fails.
    pub async fn expired_bids(&self) -> TaskLifecycleResult<Vec<Bid>> {
        Ok(self.bids.find_expired_pending(self.clock.utc()).await?)
    }

    /// Deletes the caller's rejected or withdrawn bid.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::BidNotDeletable`] for pending or
    /// accepted bids and [`TaskLifecycleError::AccessDenied`] for anyone but
    /// the bidder.
    pub async fn delete_bid(&self, bid_id: BidId, caller: impl Into<Caller>) -> TaskLifecycleResult<()> {
        let caller = caller.into();
        let bid = self.load_bid(bid_id).await?;
        require_bidder(&bid, caller.user, "delete this bid")?;
        if !self.bids.delete_if_terminal(bid_id).await? {
            return Err(TaskLifecycleError::BidNotDeletable(bid_id));
        }
        info!(%bid_id, "bid deleted");
        Ok(())
    }

    /// Lists the bids on a task visible to the caller.
    ///
    /// The poster sees every bid; anyone else sees only their own.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::TaskNotFound`] for an unknown task.
    pub async fn bids_for_task(
        &self,
        task_id: TaskId,
        viewer: UserId,
    ) -> TaskLifecycleResult<Vec<Bid>> {
        let task = self.load_task(task_id).await?;
        let bids = self.bids.find_by_task(task_id).await?;
        if task.poster() == viewer {
            return Ok(bids);
        }
        Ok(bids.into_iter().filter(|bid| bid.bidder() == viewer).collect())
    }

    /// Lists every bid placed by `bidder`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::BidRepository`] when the lookup fails.
    pub async fn bids_by(&self, bidder: UserId) -> TaskLifecycleResult<Vec<Bid>> {
        Ok(self.bids.find_by_bidder(bidder).await?)
    }

    pub(super) fn notify_deadline_approaching(&self, task: &Task) {
        self.events.deadline_approaching(task);
    }

    async fn decide(
        &self,
        task: Task,
        bid: Bid,
        actor: Actor,
        origin: Option<ConnectionId>,
    ) -> TaskLifecycleResult<Bid> {
        if !self.bids.transition_if(&bid, BidStatus::Pending).await? {
            return Err(TaskLifecycleError::AlreadyDecided(task.id()));
        }
        let mut task = task;
        let count = self.recount(task.id()).await?;
        task.set_bid_count(count);
        info!(
            task_id = %task.id(),
            bid_id = %bid.id(),
            status = %bid.status(),
            %actor,
            "bid decided"
        );
        self.events
            .bid_transition(&task, &bid, BidStatus::Pending, actor, origin);
        Ok(bid)
    }

    /// Undoes a bid stored by a placement that lost to a concurrent task
    /// change.
    async fn roll_back_bid(&self, bid: &mut Bid) -> TaskLifecycleResult<()> {
        bid.reject(&*self.clock)?;
        if self.bids.transition_if(bid, BidStatus::Pending).await? {
            self.bids.delete_if_terminal(bid.id()).await?;
        }
        self.recount(bid.task_id()).await?;
        warn!(
            task_id = %bid.task_id(),
            bid_id = %bid.id(),
            "bid rolled back after concurrent task change"
        );
        Ok(())
    }

    async fn load_bid(&self, bid_id: BidId) -> TaskLifecycleResult<Bid> {
        self.bids
            .find_by_id(bid_id)
            .await?
            .ok_or(TaskLifecycleError::BidNotFound(bid_id))
    }

    async fn load_bid_on(&self, task_id: TaskId, bid_id: BidId) -> TaskLifecycleResult<Bid> {
        let bid = self.load_bid(bid_id).await?;
        if bid.task_id() != task_id {
            return Err(TaskLifecycleError::BidTaskMismatch { bid_id, task_id });
        }
        Ok(bid)
    }
}

fn require_bidder(bid: &Bid, user: UserId, action: &'static str) -> TaskLifecycleResult<()> {
    if bid.bidder() != user {
        return Err(TaskLifecycleError::AccessDenied { user, action });
    }
    Ok(())
}
