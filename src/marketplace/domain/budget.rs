//! Budget ranges and platform-wide bounds.

use super::MarketplaceDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-wide bounds every task budget must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetBounds {
    floor: u32,
    ceiling: u32,
}

impl BudgetBounds {
    /// Default platform bounds.
    pub const PLATFORM: Self = Self {
        floor: 50,
        ceiling: 2000,
    };

    /// Creates validated bounds.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvertedBudget`] when `floor`
    /// exceeds `ceiling`.
    pub const fn new(floor: u32, ceiling: u32) -> Result<Self, MarketplaceDomainError> {
        if floor > ceiling {
            return Err(MarketplaceDomainError::InvertedBudget {
                min: floor,
                max: ceiling,
            });
        }
        Ok(Self { floor, ceiling })
    }

    /// Returns the lower bound.
    #[must_use]
    pub const fn floor(self) -> u32 {
        self.floor
    }

    /// Returns the upper bound.
    #[must_use]
    pub const fn ceiling(self) -> u32 {
        self.ceiling
    }
}

impl Default for BudgetBounds {
    fn default() -> Self {
        Self::PLATFORM
    }
}

/// Inclusive budget range offered by a task poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    min: u32,
    max: u32,
}

impl Budget {
    /// Creates a budget range validated against the platform bounds.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceDomainError::InvertedBudget`] when `min > max`
    /// and [`MarketplaceDomainError::BudgetOutsideBounds`] when either end
    /// leaves `bounds`.
    pub const fn new(
        min: u32,
        max: u32,
        bounds: BudgetBounds,
    ) -> Result<Self, MarketplaceDomainError> {
        if min > max {
            return Err(MarketplaceDomainError::InvertedBudget { min, max });
        }
        if min < bounds.floor || max > bounds.ceiling {
            return Err(MarketplaceDomainError::BudgetOutsideBounds {
                min,
                max,
                floor: bounds.floor,
                ceiling: bounds.ceiling,
            });
        }
        Ok(Self { min, max })
    }

    /// Returns the lower end of the range.
    #[must_use]
    pub const fn min(self) -> u32 {
        self.min
    }

    /// Returns the upper end of the range.
    #[must_use]
    pub const fn max(self) -> u32 {
        self.max
    }

    /// Returns `true` when `amount` lies within the inclusive range.
    #[must_use]
    pub const fn contains(self, amount: u32) -> bool {
        amount >= self.min && amount <= self.max
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}
