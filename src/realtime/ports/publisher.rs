//! Publish capability injected into event producers.

use crate::realtime::domain::OutboundEvent;

/// Accepts events for fan-out to subscribers of the event's channel.
///
/// Publishing never fails from the producer's point of view: delivery is
/// best-effort to currently connected sessions.
pub trait EventPublisher: Send + Sync {
    /// Publishes one event.
    fn publish(&self, event: OutboundEvent);
}
