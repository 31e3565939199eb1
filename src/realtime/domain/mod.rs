//! Domain types for channels, events and the duplex wire protocol.

mod channel;
mod error;
mod event;
mod ids;
mod protocol;

pub use channel::{Channel, ChannelParseError};
pub use error::RealtimeError;
pub use event::{DeliveredEvent, EventKind, OutboundEvent};
pub use ids::{ConnectionId, EventId};
pub use protocol::{ClientCommand, ServerFrame};
