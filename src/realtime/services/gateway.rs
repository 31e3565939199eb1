//! Transport-facing contract for duplex connections.

use super::{RoomRegistry, TypingTracker};
use crate::error::Classify;
use crate::marketplace::domain::UserId;
use crate::realtime::{
    domain::{Channel, ClientCommand, ConnectionId, EventKind, OutboundEvent, RealtimeError, ServerFrame},
    ports::{ChannelAccessPolicy, EventPublisher, TokenVerifier},
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};

/// Handles the commands of live connections and their lifecycle.
///
/// A transport accepts a socket, calls [`RealtimeGateway::connect`], forwards
/// decoded frames to [`RealtimeGateway::handle_frame`], writes every frame
/// from the returned receiver, and calls [`RealtimeGateway::disconnect`] when
/// the socket closes.
#[derive(Clone)]
pub struct RealtimeGateway {
    registry: Arc<RoomRegistry>,
    publisher: Arc<dyn EventPublisher>,
    typing: TypingTracker,
    tokens: Arc<dyn TokenVerifier>,
    access: Arc<dyn ChannelAccessPolicy>,
}

impl RealtimeGateway {
    /// Creates a gateway.
    #[must_use]
    pub fn new(
        registry: Arc<RoomRegistry>,
        publisher: Arc<dyn EventPublisher>,
        typing: TypingTracker,
        tokens: Arc<dyn TokenVerifier>,
        access: Arc<dyn ChannelAccessPolicy>,
    ) -> Self {
        Self {
            registry,
            publisher,
            typing,
            tokens,
            access,
        }
    }

    /// Returns the typing tracker.
    #[must_use]
    pub const fn typing(&self) -> &TypingTracker {
        &self.typing
    }

    /// Registers a new connection and returns the stream of frames to send.
    #[must_use]
    pub fn connect(&self) -> (ConnectionId, UnboundedReceiver<ServerFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = self.registry.register(sender);
        info!(connection_id = %connection, "connection opened");
        (connection, receiver)
    }

    /// Decodes and handles one text frame, always producing a reply frame.
    pub async fn handle_frame(&self, connection: ConnectionId, frame: &str) -> ServerFrame {
        let result = match ClientCommand::parse(frame) {
            Ok(command) => self.handle(connection, command).await,
            Err(error) => Err(error),
        };
        result.unwrap_or_else(|error| {
            warn!(connection_id = %connection, %error, "command rejected");
            ServerFrame::Error {
                code: error.kind().code().to_owned(),
                message: error.to_string(),
            }
        })
    }

    /// Handles one decoded command.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError`] when the command is not permitted.
    pub async fn handle(
        &self,
        connection: ConnectionId,
        command: ClientCommand,
    ) -> Result<ServerFrame, RealtimeError> {
        match command {
            ClientCommand::Authenticate { token } => self.authenticate(connection, &token).await,
            ClientCommand::JoinChannel { channel } => self.join(connection, channel).await,
            ClientCommand::LeaveChannel { channel } => {
                self.registry.leave(connection, channel)?;
                Ok(ServerFrame::Left { channel })
            }
            ClientCommand::TypingStart { task_id } => {
                let user = self.require_member(connection, Channel::Task(task_id))?;
                self.typing.start(task_id, user, Some(connection));
                Ok(ServerFrame::TypingAck { task_id })
            }
            ClientCommand::TypingStop { task_id } => {
                let user = self.require_member(connection, Channel::Task(task_id))?;
                self.typing.stop(task_id, user, Some(connection));
                Ok(ServerFrame::TypingAck { task_id })
            }
        }
    }

    /// Releases a closed connection.
    ///
    /// When this was the user's last connection, clears their typing
    /// indicators and tells active counterparties the user went offline.
    /// Connections already pruned by a failed delivery are released here too.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let Some(session) = self.registry.unregister(connection) else {
            return;
        };
        info!(connection_id = %connection, channels = session.channels.len(), "connection closed");
        let Some(user) = session.user else {
            return;
        };
        if session.last_connection {
            self.typing.stop_all_for(user);
            self.broadcast_presence(user, EventKind::UserOffline).await;
        }
    }

    async fn authenticate(
        &self,
        connection: ConnectionId,
        token: &str,
    ) -> Result<ServerFrame, RealtimeError> {
        let user = self
            .tokens
            .verify(token)
            .await
            .ok_or(RealtimeError::InvalidToken)?;
        let first = self.registry.authenticate(connection, user)?;
        self.registry.join(connection, Channel::User(user))?;
        info!(connection_id = %connection, user_id = %user, "connection authenticated");
        if first {
            self.broadcast_presence(user, EventKind::UserOnline).await;
        }
        Ok(ServerFrame::Authenticated { user_id: user })
    }

    async fn join(
        &self,
        connection: ConnectionId,
        channel: Channel,
    ) -> Result<ServerFrame, RealtimeError> {
        let user = self
            .registry
            .identity(connection)?
            .ok_or(RealtimeError::NotAuthenticated)?;
        if !self.access.can_join(user, channel).await? {
            warn!(connection_id = %connection, user_id = %user, %channel, "join denied");
            return Err(RealtimeError::AccessDenied(channel));
        }
        self.registry.join(connection, channel)?;
        Ok(ServerFrame::Joined { channel })
    }

    fn require_member(
        &self,
        connection: ConnectionId,
        channel: Channel,
    ) -> Result<UserId, RealtimeError> {
        let user = self
            .registry
            .identity(connection)?
            .ok_or(RealtimeError::NotAuthenticated)?;
        if !self.registry.is_member(connection, channel) {
            return Err(RealtimeError::AccessDenied(channel));
        }
        Ok(user)
    }

    async fn broadcast_presence(&self, user: UserId, kind: EventKind) {
        let counterparties = match self.access.active_counterparties(user).await {
            Ok(found) => found,
            Err(error) => {
                warn!(user_id = %user, %error, "presence lookup failed");
                return;
            }
        };
        for counterparty in counterparties {
            self.publisher.publish(OutboundEvent::new(
                Channel::User(counterparty),
                kind,
                json!({ "userId": user }),
            ));
        }
    }
}
