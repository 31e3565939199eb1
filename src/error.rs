//! Failure taxonomy shared by every service boundary.
//!
//! Services return their own typed errors. Each of them classifies itself
//! into an [`ErrorKind`] so the transport boundary can map failures to stable
//! response codes without inspecting service internals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or out-of-range input. The client must fix and resend.
    Validation,
    /// The referenced entity does not exist.
    NotFound,
    /// The caller is authenticated but not authorised for the entity.
    AccessDenied,
    /// The caller has not completed the authentication handshake.
    NotAuthenticated,
    /// The state machine rejects the requested move.
    InvalidTransition,
    /// A competing acceptance committed first.
    AlreadyDecided,
    /// The task is not open for bidding.
    NotAcceptingBids,
    /// The bidder already holds a non-withdrawn bid on the task.
    DuplicateBid,
    /// The poster attempted to bid on their own task.
    SelfBidding,
    /// The bid amount lies outside the task budget.
    BudgetOutOfRange,
    /// Infrastructure failure. Details are never exposed to clients.
    Internal,
}

impl ErrorKind {
    /// Returns the stable wire code for this kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::AlreadyDecided => "ALREADY_DECIDED",
            Self::NotAcceptingBids => "NOT_ACCEPTING_BIDS",
            Self::DuplicateBid => "DUPLICATE_BID",
            Self::SelfBidding => "SELF_BIDDING",
            Self::BudgetOutOfRange => "BUDGET_OUT_OF_RANGE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status used when this kind crosses the HTTP boundary.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Validation | Self::SelfBidding | Self::BudgetOutOfRange => 400,
            Self::NotAuthenticated => 401,
            Self::AccessDenied => 403,
            Self::NotFound => 404,
            Self::InvalidTransition
            | Self::AlreadyDecided
            | Self::NotAcceptingBids
            | Self::DuplicateBid => 409,
            Self::Internal => 500,
        }
    }

    /// Returns `true` when the failure originates in infrastructure rather
    /// than in the caller's request.
    #[must_use]
    pub const fn is_internal(self) -> bool {
        matches!(self, Self::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Implemented by every service error so callers can classify failures.
pub trait Classify {
    /// Returns the taxonomy entry for this failure.
    fn kind(&self) -> ErrorKind;
}
