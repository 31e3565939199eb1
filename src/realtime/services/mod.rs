//! Room registry, event bus, typing timers and the connection gateway.

mod bus;
mod gateway;
mod notification;
mod registry;
mod typing;

pub use bus::InMemoryEventBus;
pub use gateway::RealtimeGateway;
pub use notification::{NotificationKind, notification};
pub use registry::{DeliveryReport, DisconnectedSession, RoomRegistry};
pub use typing::TypingTracker;
