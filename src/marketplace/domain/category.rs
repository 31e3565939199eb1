//! Closed set of task categories.

use super::MarketplaceDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a posted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Assignment help, proofreading, notes.
    Academic,
    /// One-to-one tutoring sessions.
    Tutoring,
    /// Picking up and dropping off items.
    Delivery,
    /// Queueing, shopping and other errands.
    Errands,
    /// Device setup, repairs and software help.
    TechSupport,
    /// Graphic, slide and poster design.
    Design,
    /// Dorm moves and heavy lifting.
    Moving,
    /// Room and shared-space cleaning.
    Cleaning,
    /// Anything else.
    Other,
}

impl TaskCategory {
    /// All categories in display order.
    pub const ALL: [Self; 9] = [
        Self::Academic,
        Self::Tutoring,
        Self::Delivery,
        Self::Errands,
        Self::TechSupport,
        Self::Design,
        Self::Moving,
        Self::Cleaning,
        Self::Other,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Tutoring => "tutoring",
            Self::Delivery => "delivery",
            Self::Errands => "errands",
            Self::TechSupport => "tech_support",
            Self::Design => "design",
            Self::Moving => "moving",
            Self::Cleaning => "cleaning",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for TaskCategory {
    type Error = MarketplaceDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| MarketplaceDomainError::InvalidCategory(value.to_owned()))
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
