//! Step definitions for bid acceptance scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
