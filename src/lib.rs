//! Bidboard: campus task marketplace core.
//!
//! Students post tasks with a budget and deadline, helpers bid, the poster
//! accepts exactly one bid and the task moves through assignment, work and
//! completion. State changes are fanned out in real time to task and user
//! channels, and participants converse through a per-task chat.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports
//! - **Services**: Orchestration over ports
//!
//! # Modules
//!
//! - [`marketplace`]: Task and bid lifecycle with the expiry scheduler
//! - [`chat`]: Task conversations, reactions and read receipts
//! - [`realtime`]: Rooms, event fan-out, typing and presence
//! - [`api`]: Response envelope for transports
//! - [`app`]: Composition root

pub mod api;
pub mod app;
pub mod chat;
pub mod clock;
pub mod config;
pub mod error;
pub mod marketplace;
pub mod realtime;
pub mod telemetry;
