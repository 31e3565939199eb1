//! Shared world state for bid acceptance scenarios.

use std::sync::Arc;

use bidboard::{
    app::Marketplace,
    clock::ManualClock,
    config::MarketplaceConfig,
    marketplace::{
        domain::{Bid, Task, TaskId, UserId},
        services::{AcceptedBid, TaskLifecycleError},
    },
};
use rstest::fixture;

/// Scenario world for bid acceptance behaviour tests.
pub struct BidWorld {
    pub market: Marketplace<ManualClock>,
    pub clock: ManualClock,
    pub poster: UserId,
    pub task_id: Option<TaskId>,
    pub bids: Vec<Bid>,
    pub last_accept: Option<Result<AcceptedBid, TaskLifecycleError>>,
    pub last_close: Option<Result<Task, TaskLifecycleError>>,
    pub last_bid: Option<Result<Bid, TaskLifecycleError>>,
}

impl BidWorld {
    /// Creates a world around a freshly composed marketplace.
    #[must_use]
    pub fn new() -> Self {
        let clock = ManualClock::starting_now();
        let market = Marketplace::with_clock(&MarketplaceConfig::default(), Arc::new(clock.clone()))
            .expect("default configuration is valid");
        Self {
            market,
            clock,
            poster: UserId::new(),
            task_id: None,
            bids: Vec::new(),
            last_accept: None,
            last_close: None,
            last_bid: None,
        }
    }

    /// Returns the scenario task.
    ///
    /// # Errors
    ///
    /// Returns an error when no task was posted yet.
    pub fn task_id(&self) -> Result<TaskId, eyre::Report> {
        self.task_id
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for BidWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BidWorld {
    BidWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Maps an ordinal word to a zero-based index.
///
/// # Errors
///
/// Returns an error for words outside `first` to `fifth`.
pub fn ordinal_index(ordinal: &str) -> Result<usize, eyre::Report> {
    ["first", "second", "third", "fourth", "fifth"]
        .iter()
        .position(|word| *word == ordinal)
        .ok_or_else(|| eyre::eyre!("unsupported ordinal: {ordinal}"))
}
