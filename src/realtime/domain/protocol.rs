//! Frames exchanged over a duplex connection.

use super::{Channel, DeliveredEvent, RealtimeError};
use crate::marketplace::domain::{TaskId, UserId};
use serde::{Deserialize, Serialize};

/// A frame sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Binds the connection to the identity behind `token`.
    Authenticate {
        /// Credential issued by the external identity provider.
        token: String,
    },
    /// Subscribes to a channel.
    JoinChannel {
        /// Channel to join.
        channel: Channel,
    },
    /// Unsubscribes from a channel.
    LeaveChannel {
        /// Channel to leave.
        channel: Channel,
    },
    /// Signals that the user is typing in a task conversation.
    TypingStart {
        /// Task conversation.
        #[serde(alias = "taskId")]
        task_id: TaskId,
    },
    /// Signals that the user stopped typing.
    TypingStop {
        /// Task conversation.
        #[serde(alias = "taskId")]
        task_id: TaskId,
    },
}

impl ClientCommand {
    /// Decodes a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::MalformedCommand`] when the frame is not a
    /// known command.
    pub fn parse(frame: &str) -> Result<Self, RealtimeError> {
        serde_json::from_str(frame).map_err(|err| RealtimeError::MalformedCommand(err.to_string()))
    }
}

/// A frame sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A published event.
    Event(DeliveredEvent),
    /// Acknowledges authentication.
    Authenticated {
        /// Bound identity.
        user_id: UserId,
    },
    /// Acknowledges a join.
    Joined {
        /// Joined channel.
        channel: Channel,
    },
    /// Acknowledges a leave.
    Left {
        /// Left channel.
        channel: Channel,
    },
    /// Acknowledges a typing signal.
    TypingAck {
        /// Task conversation.
        task_id: TaskId,
    },
    /// Reports a failed command.
    Error {
        /// Stable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },
}
