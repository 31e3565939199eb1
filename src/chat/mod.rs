//! Task conversations between poster and assignee.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - In-memory adapters in [`adapters`]
//! - The chat service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
