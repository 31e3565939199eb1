//! Orchestration services for the marketplace.

mod bidding;
mod events;
mod expiry;
mod lifecycle;

pub use bidding::{AcceptedBid, PlaceBidRequest};
pub use expiry::{BidExpiryScheduler, SweepReport};
pub use lifecycle::{
    Caller, CompleteTaskRequest, CreateTaskRequest, TaskLifecycleError, TaskLifecycleResult,
    TaskLifecycleService, UpdateTaskRequest,
};
