//! Unit tests for task conversations.

mod domain_tests;
mod fixtures;
