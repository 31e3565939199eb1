//! In-process event bus backed by the room registry.

use super::RoomRegistry;
use crate::realtime::{domain::OutboundEvent, ports::EventPublisher};
use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

/// Single-process publish/subscribe bus.
///
/// Replacing this with a relay to an external broker is the extension point
/// for running several server processes.
#[derive(Clone)]
pub struct InMemoryEventBus<C>
where
    C: Clock + Send + Sync,
{
    registry: Arc<RoomRegistry>,
    clock: Arc<C>,
}

impl<C> InMemoryEventBus<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a bus delivering through `registry`.
    #[must_use]
    pub const fn new(registry: Arc<RoomRegistry>, clock: Arc<C>) -> Self {
        Self { registry, clock }
    }
}

impl<C> EventPublisher for InMemoryEventBus<C>
where
    C: Clock + Send + Sync,
{
    fn publish(&self, event: OutboundEvent) {
        let channel = event.channel;
        let kind = event.kind;
        let report = self.registry.deliver(event, self.clock.utc());
        debug!(
            %channel,
            event = kind.as_str(),
            delivered = report.delivered,
            pruned = report.pruned,
            "event published"
        );
    }
}
