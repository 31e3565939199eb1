//! In-memory integration tests for the composed marketplace.
//!
//! Tests are organised into modules by concern:
//! - `marketplace_flow_tests`: task and bid lifecycle, scheduler, envelopes
//! - `realtime_flow_tests`: delivery to live connections
//! - `config_tests`: configuration loading and its effects

mod in_memory {
    pub mod helpers;

    mod config_tests;
    mod marketplace_flow_tests;
    mod realtime_flow_tests;
}
