//! Real-time event fabric: presence, rooms, fan-out and typing indicators.
//!
//! Producers publish through the injected [`ports::EventPublisher`]; the
//! in-process [`services::InMemoryEventBus`] delivers to connections tracked
//! by the [`services::RoomRegistry`]. Transports drive the
//! [`services::RealtimeGateway`].

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
