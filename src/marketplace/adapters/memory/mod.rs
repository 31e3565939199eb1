//! In-memory Entity Store adapters.
//!
//! Each adapter guards its state with a single `RwLock`, so every
//! conditional write is atomic with respect to concurrent callers.

mod bid;
mod stats;
mod task;

pub use bid::InMemoryBidRepository;
pub use stats::InMemoryUserStatsRepository;
pub use task::InMemoryTaskRepository;
