//! Named subscription scopes.

use crate::marketplace::domain::{TaskId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A real-time subscription scope.
///
/// Rendered as `task_<id>` or `user_<id>`; `task:<id>` and `user:<id>` are
/// accepted when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Channel {
    /// Conversation and lifecycle events of one task.
    Task(TaskId),
    /// Personal notifications of one user.
    User(UserId),
}

/// Error returned for an unrecognised channel name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid channel name: {0}")]
pub struct ChannelParseError(pub String);

impl Channel {
    /// Returns the task of a task channel.
    #[must_use]
    pub const fn task_id(self) -> Option<TaskId> {
        match self {
            Self::Task(task_id) => Some(task_id),
            Self::User(_) => None,
        }
    }
}

impl FromStr for Channel {
    type Err = ChannelParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ChannelParseError(value.to_owned());
        let trimmed = value.trim();
        let (scope, id) = trimmed
            .split_once(['_', ':'])
            .ok_or_else(invalid)?;
        match scope {
            "task" => id.parse().map(Self::Task).map_err(|_| invalid()),
            "user" => id.parse().map(Self::User).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Channel {
    type Error = ChannelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.to_string()
    }
}

impl From<TaskId> for Channel {
    fn from(task_id: TaskId) -> Self {
        Self::Task(task_id)
    }
}

impl From<UserId> for Channel {
    fn from(user: UserId) -> Self {
        Self::User(user)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(task_id) => write!(f, "task_{task_id}"),
            Self::User(user) => write!(f, "user_{user}"),
        }
    }
}
