//! Events published by producers and delivered to connections.

use super::{Channel, ConnectionId, EventId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Closed set of server-emitted event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A chat message was sent.
    NewMessage,
    /// A chat message was edited.
    MessageEdited,
    /// A chat message was soft-deleted.
    MessageDeleted,
    /// A reaction was added or replaced.
    ReactionAdded,
    /// A reaction was removed.
    ReactionRemoved,
    /// Messages were marked as read.
    MessagesRead,
    /// A task changed status.
    TaskStatusChanged,
    /// A bid was accepted.
    BidAccepted,
    /// A bid was rejected.
    BidRejected,
    /// A bid was withdrawn.
    BidWithdrawn,
    /// A user is typing.
    UserTyping,
    /// A user stopped typing.
    StoppedTyping,
    /// A user came online.
    UserOnline,
    /// A user went offline.
    UserOffline,
    /// A personal notification.
    Notification,
}

impl EventKind {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::MessageEdited => "message_edited",
            Self::MessageDeleted => "message_deleted",
            Self::ReactionAdded => "reaction_added",
            Self::ReactionRemoved => "reaction_removed",
            Self::MessagesRead => "messages_read",
            Self::TaskStatusChanged => "task_status_changed",
            Self::BidAccepted => "bid_accepted",
            Self::BidRejected => "bid_rejected",
            Self::BidWithdrawn => "bid_withdrawn",
            Self::UserTyping => "user_typing",
            Self::StoppedTyping => "stopped_typing",
            Self::UserOnline => "user_online",
            Self::UserOffline => "user_offline",
            Self::Notification => "notification",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event handed to the bus by a producer.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEvent {
    /// Target channel.
    pub channel: Channel,
    /// Event name.
    pub kind: EventKind,
    /// JSON payload.
    pub payload: Value,
    /// Connection whose action caused the event; excluded from fan-out.
    pub origin: Option<ConnectionId>,
}

impl OutboundEvent {
    /// Creates an event with no originating connection.
    #[must_use]
    pub const fn new(channel: Channel, kind: EventKind, payload: Value) -> Self {
        Self {
            channel,
            kind,
            payload,
            origin: None,
        }
    }

    /// Sets the originating connection.
    #[must_use]
    pub const fn with_origin(mut self, origin: Option<ConnectionId>) -> Self {
        self.origin = origin;
        self
    }
}

/// An event as delivered to one connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredEvent {
    /// Unique identifier shared by every copy of one publication.
    pub event_id: EventId,
    /// Per-channel publication sequence number, starting at 1.
    pub sequence: u64,
    /// Channel the event was published to.
    pub channel: Channel,
    /// Event name.
    pub event: EventKind,
    /// JSON payload.
    pub payload: Value,
    /// Publication time.
    pub occurred_at: DateTime<Utc>,
}
