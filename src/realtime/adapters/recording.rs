//! Publisher that records events instead of delivering them.

use crate::realtime::{
    domain::{Channel, EventKind, OutboundEvent},
    ports::EventPublisher,
};
use std::sync::{Arc, Mutex, PoisonError};

/// Captures published events in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventPublisher {
    events: Arc<Mutex<Vec<OutboundEvent>>>,
}

impl RecordingEventPublisher {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded event in publication order.
    #[must_use]
    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns recorded events published to `channel`.
    #[must_use]
    pub fn events_on(&self, channel: Channel) -> Vec<OutboundEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.channel == channel)
            .collect()
    }

    /// Returns recorded events of `kind`.
    #[must_use]
    pub fn events_of(&self, kind: EventKind) -> Vec<OutboundEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.kind == kind)
            .collect()
    }

    /// Discards recorded events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventPublisher for RecordingEventPublisher {
    fn publish(&self, event: OutboundEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
