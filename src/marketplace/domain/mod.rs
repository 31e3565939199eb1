//! Domain model for the task marketplace.
//!
//! Tasks move through `Open -> Assigned -> InProgress -> Completed`, with a
//! poster-initiated close available from any non-terminal status. Bids are
//! pending offers against open tasks; accepting one bid rejects every other
//! pending bid on the same task. Infrastructure concerns stay outside this
//! boundary.

mod bid;
mod budget;
mod category;
mod error;
mod ids;
mod rules;
mod task;
mod user;

pub use bid::{Bid, BidDraft, BidStatus};
pub use budget::{Budget, BudgetBounds};
pub use category::TaskCategory;
pub use error::{MarketplaceDomainError, ParseBidStatusError, ParseTaskStatusError};
pub use ids::{BidId, ParseIdError, TaskId, UserId};
pub use rules::{Actor, MarketplaceRules};
pub use task::{CompletionRecord, Task, TaskDraft, TaskPatch, TaskStatus, TaskView};
pub use user::{Rating, UserStats};
