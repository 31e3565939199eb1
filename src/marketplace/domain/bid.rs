//! Bid entity and its status machine.

use super::{BidId, MarketplaceDomainError, MarketplaceRules, ParseBidStatusError, TaskId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_TIMELINE_LENGTH: usize = 200;

/// Bid lifecycle status. Every status other than `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    /// Awaiting a decision by the poster.
    Pending,
    /// Chosen by the poster.
    Accepted,
    /// Declined by the poster or by a cascade.
    Rejected,
    /// Retracted by the bidder or expired.
    Withdrawn,
}

impl BidStatus {
    /// Every status.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Accepted,
        Self::Rejected,
        Self::Withdrawn,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    /// Returns `true` once a decision has been reached.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns `true` for bids counted in a task's bid count.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }

    /// Returns `true` when a bid in this status prevents the same bidder
    /// from bidding again on the task.
    #[must_use]
    pub const fn blocks_rebid(self) -> bool {
        !matches!(self, Self::Withdrawn)
    }
}

impl TryFrom<&str> for BidStatus {
    type Error = ParseBidStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseBidStatusError(value.to_owned()))
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bidder-supplied content of a new bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidDraft {
    /// Offered amount.
    pub amount: u32,
    /// Free-text delivery estimate.
    pub proposed_timeline: String,
    /// Optional note to the poster.
    pub cover_note: Option<String>,
    /// Whether the bid is visually highlighted.
    pub highlighted: bool,
}

/// An offer by a helper to complete a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    id: BidId,
    task_id: TaskId,
    bidder: UserId,
    amount: u32,
    proposed_timeline: String,
    cover_note: Option<String>,
    is_highlighted: bool,
    status: BidStatus,
    auto_withdraw_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Bid {
    /// Creates a pending bid.
    ///
    /// Budget containment depends on the task and is checked by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::EmptyTimeline`] or
    /// [`MarketplaceDomainError::TimelineTooLong`] for an unusable timeline.
    pub fn new(
        task_id: TaskId,
        bidder: UserId,
        draft: BidDraft,
        rules: &MarketplaceRules,
        clock: &impl Clock,
    ) -> Result<Self, MarketplaceDomainError> {
        let timeline = draft.proposed_timeline.trim();
        if timeline.is_empty() {
            return Err(MarketplaceDomainError::EmptyTimeline);
        }
        if timeline.chars().count() > MAX_TIMELINE_LENGTH {
            return Err(MarketplaceDomainError::TimelineTooLong);
        }
        let now = clock.utc();
        Ok(Self {
            id: BidId::new(),
            task_id,
            bidder,
            amount: draft.amount,
            proposed_timeline: timeline.to_owned(),
            cover_note: draft
                .cover_note
                .map(|note| note.trim().to_owned())
                .filter(|note| !note.is_empty()),
            is_highlighted: draft.highlighted,
            status: BidStatus::Pending,
            auto_withdraw_at: now + rules.auto_withdraw_after,
            decided_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the bid identifier.
    #[must_use]
    pub const fn id(&self) -> BidId {
        self.id
    }

    /// Returns the task the bid targets.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the bidder.
    #[must_use]
    pub const fn bidder(&self) -> UserId {
        self.bidder
    }

    /// Returns the offered amount.
    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount
    }

    /// Returns the proposed timeline.
    #[must_use]
    pub fn proposed_timeline(&self) -> &str {
        &self.proposed_timeline
    }

    /// Returns the cover note.
    #[must_use]
    pub fn cover_note(&self) -> Option<&str> {
        self.cover_note.as_deref()
    }

    /// Returns whether the bid is highlighted.
    #[must_use]
    pub const fn is_highlighted(&self) -> bool {
        self.is_highlighted
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> BidStatus {
        self.status
    }

    /// Returns when a still-pending bid is withdrawn automatically.
    #[must_use]
    pub const fn auto_withdraw_at(&self) -> DateTime<Utc> {
        self.auto_withdraw_at
    }

    /// Returns when the bid left `Pending`.
    #[must_use]
    pub const fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
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

    /// Returns `true` for a pending bid whose auto-withdraw time has passed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == BidStatus::Pending && self.auto_withdraw_at <= now
    }

    /// Returns `true` when the bidder may delete the record.
    #[must_use]
    pub const fn is_deletable(&self) -> bool {
        matches!(self.status, BidStatus::Rejected | BidStatus::Withdrawn)
    }

    /// Marks the bid accepted.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidBidTransition`] unless pending.
    pub fn accept(&mut self, clock: &impl Clock) -> Result<(), MarketplaceDomainError> {
        self.decide(BidStatus::Accepted, clock.utc())
    }

    /// Marks the bid rejected.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidBidTransition`] unless pending.
    pub fn reject(&mut self, clock: &impl Clock) -> Result<(), MarketplaceDomainError> {
        self.reject_at(clock.utc())
    }

    /// Marks the bid rejected at an explicit instant.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidBidTransition`] unless pending.
    pub fn reject_at(&mut self, at: DateTime<Utc>) -> Result<(), MarketplaceDomainError> {
        self.decide(BidStatus::Rejected, at)
    }

    /// Marks the bid withdrawn.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidBidTransition`] unless pending.
    pub fn withdraw(&mut self, clock: &impl Clock) -> Result<(), MarketplaceDomainError> {
        self.decide(BidStatus::Withdrawn, clock.utc())
    }

    /// Reverts an acceptance whose task assignment could not be committed.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidBidTransition`] unless
    /// accepted.
    pub fn rescind_at(&mut self, at: DateTime<Utc>) -> Result<(), MarketplaceDomainError> {
        if self.status != BidStatus::Accepted {
            return Err(MarketplaceDomainError::InvalidBidTransition {
                bid_id: self.id,
                from: self.status,
                to: BidStatus::Rejected,
            });
        }
        self.status = BidStatus::Rejected;
        self.decided_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    fn decide(&mut self, target: BidStatus, at: DateTime<Utc>) -> Result<(), MarketplaceDomainError> {
        if self.status != BidStatus::Pending || target == BidStatus::Pending {
            return Err(MarketplaceDomainError::InvalidBidTransition {
                bid_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.decided_at = Some(at);
        self.updated_at = at;
        Ok(())
    }
}
