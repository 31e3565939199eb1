//! Tunable marketplace rules and the acting party of a transition.

use super::{BudgetBounds, UserId};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation limits and time windows applied by the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketplaceRules {
    /// Platform-wide budget bounds.
    pub budget_bounds: BudgetBounds,
    /// Maximum task title length in characters.
    pub max_title_length: usize,
    /// Maximum task description length in characters.
    pub max_description_length: usize,
    /// Age after which a pending bid is withdrawn automatically.
    pub auto_withdraw_after: Duration,
    /// Time-to-deadline at or below which a task counts as urgent.
    pub urgency_window: Duration,
}

impl Default for MarketplaceRules {
    fn default() -> Self {
        Self {
            budget_bounds: BudgetBounds::PLATFORM,
            max_title_length: 100,
            max_description_length: 2000,
            auto_withdraw_after: Duration::days(7),
            urgency_window: Duration::hours(24),
        }
    }
}

/// Party responsible for a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// An authenticated user.
    User(UserId),
    /// A background process such as the expiry scheduler.
    System,
}

impl Actor {
    /// Returns the user identity when the actor is a user.
    #[must_use]
    pub const fn user(self) -> Option<UserId> {
        match self {
            Self::User(user) => Some(user),
            Self::System => None,
        }
    }
}

impl From<UserId> for Actor {
    fn from(user: UserId) -> Self {
        Self::User(user)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user) => write!(f, "user:{user}"),
            Self::System => f.write_str("system"),
        }
    }
}
