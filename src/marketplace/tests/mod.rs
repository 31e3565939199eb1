//! Unit tests for the marketplace module.
//!
//! Domain tests cover the task and bid state machines; service tests drive
//! the lifecycle engine against the in-memory adapters; expiry tests cover
//! the scheduler sweep; concurrency tests cover stores that change
//! underneath an operation.

mod fixtures;
