//! Task marketplace: the task and bid state machine and its expiry sweep.
//!
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Entity Store contracts in [`ports`]
//! - In-memory implementations in [`adapters`]
//! - The lifecycle engine and scheduler in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
