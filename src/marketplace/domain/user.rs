//! Ratings and aggregate per-user marketplace statistics.

use super::{MarketplaceDomainError, UserId};
use serde::{Deserialize, Serialize};

/// Star rating from 1 to 5 given by a poster to an assignee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Creates a validated rating.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvalidRating`] outside 1 to 5.
    pub const fn new(value: u8) -> Result<Self, MarketplaceDomainError> {
        if value == 0 || value > 5 {
            return Err(MarketplaceDomainError::InvalidRating(value));
        }
        Ok(Self(value))
    }

    /// Returns the numeric rating.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = MarketplaceDomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Aggregate counters maintained for each user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    /// User the counters belong to.
    pub user_id: UserId,
    /// Tasks created by the user.
    pub tasks_posted: u32,
    /// Tasks completed by the user as assignee.
    pub tasks_completed: u32,
    /// Sum of accepted bid amounts on tasks the user completed.
    pub total_earned: u64,
    /// Sum of accepted bid amounts on tasks the user posted and completed.
    pub total_spent: u64,
    /// Sum of ratings received.
    pub rating_total: u32,
    /// Number of ratings received.
    pub rating_count: u32,
}

impl UserStats {
    /// Creates zeroed counters for `user_id`.
    #[must_use]
    pub const fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            tasks_posted: 0,
            tasks_completed: 0,
            total_earned: 0,
            total_spent: 0,
            rating_total: 0,
            rating_count: 0,
        }
    }

    /// Returns the average rating in tenths of a star, rounded half up.
    ///
    /// A 4.5 star average is reported as `45`. Returns `None` before the
    /// first rating.
    #[must_use]
    pub fn average_rating_tenths(&self) -> Option<u32> {
        let scaled = self
            .rating_total
            .saturating_mul(10)
            .saturating_add(self.rating_count.checked_div(2)?);
        scaled.checked_div(self.rating_count)
    }

    /// Records a received rating.
    pub const fn add_rating(&mut self, rating: Rating) {
        self.rating_total = self.rating_total.saturating_add(rating.value() as u32);
        self.rating_count = self.rating_count.saturating_add(1);
    }
}
