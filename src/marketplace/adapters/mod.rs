//! Adapter implementations for marketplace ports.

pub mod memory;
