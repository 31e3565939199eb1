//! Unit tests for the real-time fabric.

mod registry_tests;
mod typing_tests;
