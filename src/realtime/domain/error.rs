//! Errors raised by the presence registry and gateway.

use super::{Channel, ChannelParseError, ConnectionId};
use crate::error::{Classify, ErrorKind};
use std::sync::Arc;
use thiserror::Error;

/// Failures surfaced to real-time clients.
#[derive(Debug, Clone, Error)]
pub enum RealtimeError {
    /// The connection has not authenticated.
    #[error("connection is not authenticated")]
    NotAuthenticated,

    /// The token could not be verified.
    #[error("authentication token was rejected")]
    InvalidToken,

    /// The connection is already bound to a different identity.
    #[error("connection is already authenticated as another user")]
    IdentityMismatch,

    /// The connection is not registered.
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// The identity may not join the channel.
    #[error("access denied to channel {0}")]
    AccessDenied(Channel),

    /// The channel name is malformed.
    #[error(transparent)]
    InvalidChannel(#[from] ChannelParseError),

    /// The client frame could not be decoded.
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    /// The access policy failed to consult the store.
    #[error("access check failed: {0}")]
    AccessCheck(Arc<dyn std::error::Error + Send + Sync>),
}

impl RealtimeError {
    /// Wraps a store failure raised during an access check.
    #[must_use]
    pub fn access_check(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::AccessCheck(Arc::new(err))
    }
}

impl Classify for RealtimeError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthenticated | Self::InvalidToken => ErrorKind::NotAuthenticated,
            Self::IdentityMismatch | Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::UnknownConnection(_) => ErrorKind::NotFound,
            Self::InvalidChannel(_) | Self::MalformedCommand(_) => ErrorKind::Validation,
            Self::AccessCheck(_) => ErrorKind::Internal,
        }
    }
}
