//! Presence and room registry.
//!
//! Owns the mapping of live connections to identities and joined channels.
//! A room exists from its first join until its last member leaves. Fan-out
//! for a channel happens under the registry lock, so delivery order within a
//! channel matches publication order.
//!
//! A connection found closed during fan-out leaves its rooms but stays
//! registered until the transport reports the disconnect, so presence and
//! typing teardown run exactly once, from [`RoomRegistry::unregister`].

use crate::marketplace::domain::UserId;
use crate::realtime::domain::{
    Channel, ConnectionId, DeliveredEvent, EventId, OutboundEvent, RealtimeError, ServerFrame,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

#[derive(Debug)]
struct Session {
    user: Option<UserId>,
    channels: HashSet<Channel>,
    sender: UnboundedSender<ServerFrame>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Room {
    members: BTreeSet<ConnectionId>,
    next_sequence: u64,
}

#[derive(Debug, Default)]
struct RegistryState {
    sessions: HashMap<ConnectionId, Session>,
    rooms: HashMap<Channel, Room>,
}

impl RegistryState {
    fn session(&self, connection: ConnectionId) -> Result<&Session, RealtimeError> {
        self.sessions
            .get(&connection)
            .ok_or(RealtimeError::UnknownConnection(connection))
    }

    fn live_connections_of(&self, user: UserId) -> usize {
        self.sessions
            .values()
            .filter(|session| session.user == Some(user))
            .count()
    }

    fn leave_room(&mut self, connection: ConnectionId, channel: Channel) {
        if let Some(room) = self.rooms.get_mut(&channel) {
            room.members.remove(&connection);
            if room.members.is_empty() {
                self.rooms.remove(&channel);
                debug!(%channel, "room torn down");
            }
        }
    }

    fn close_session(&mut self, connection: ConnectionId) -> bool {
        let Some(session) = self.sessions.get_mut(&connection) else {
            return false;
        };
        session.closed = true;
        let channels: Vec<Channel> = session.channels.iter().copied().collect();
        for channel in channels {
            self.leave_room(connection, channel);
        }
        true
    }

    fn remove_session(&mut self, connection: ConnectionId) -> Option<Session> {
        let session = self.sessions.remove(&connection)?;
        for channel in &session.channels {
            self.leave_room(connection, *channel);
        }
        Some(session)
    }
}

/// Result of fanning out one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections the event was handed to.
    pub delivered: usize,
    /// Closed connections pruned from rooms during fan-out.
    pub pruned: usize,
}

/// State released when a connection closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectedSession {
    /// Identity bound to the connection, if it authenticated.
    pub user: Option<UserId>,
    /// Channels the connection had joined.
    pub channels: Vec<Channel>,
    /// Whether this was the user's last live connection.
    pub last_connection: bool,
}

/// Registry of live connections and channel rooms.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    state: Mutex<RegistryState>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new, unauthenticated connection.
    pub fn register(&self, sender: UnboundedSender<ServerFrame>) -> ConnectionId {
        let connection = ConnectionId::new();
        self.lock().sessions.insert(
            connection,
            Session {
                user: None,
                channels: HashSet::new(),
                sender,
                closed: false,
            },
        );
        connection
    }

    /// Binds `user` to the connection.
    ///
    /// Returns `true` when this is the user's first live connection.
    /// Re-authenticating as the same user is accepted and returns `false`.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UnknownConnection`] or
    /// [`RealtimeError::IdentityMismatch`].
    pub fn authenticate(&self, connection: ConnectionId, user: UserId) -> Result<bool, RealtimeError> {
        let mut state = self.lock();
        match state.session(connection)?.user {
            Some(bound) if bound == user => return Ok(false),
            Some(_) => return Err(RealtimeError::IdentityMismatch),
            None => {}
        }
        let first = state.live_connections_of(user) == 0;
        if let Some(session) = state.sessions.get_mut(&connection) {
            session.user = Some(user);
        }
        Ok(first)
    }

    /// Returns the identity bound to the connection.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UnknownConnection`].
    pub fn identity(&self, connection: ConnectionId) -> Result<Option<UserId>, RealtimeError> {
        Ok(self.lock().session(connection)?.user)
    }

    /// Adds the connection to `channel`, creating the room on first join.
    ///
    /// Authorisation is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UnknownConnection`], also for a connection
    /// already found closed.
    pub fn join(&self, connection: ConnectionId, channel: Channel) -> Result<(), RealtimeError> {
        let mut state = self.lock();
        let session = state
            .sessions
            .get_mut(&connection)
            .filter(|session| !session.closed)
            .ok_or(RealtimeError::UnknownConnection(connection))?;
        session.channels.insert(channel);
        state.rooms.entry(channel).or_default().members.insert(connection);
        Ok(())
    }

    /// Removes the connection from `channel`.
    ///
    /// Returns `false` when it was not a member.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UnknownConnection`].
    pub fn leave(&self, connection: ConnectionId, channel: Channel) -> Result<bool, RealtimeError> {
        let mut state = self.lock();
        let session = state
            .sessions
            .get_mut(&connection)
            .ok_or(RealtimeError::UnknownConnection(connection))?;
        if !session.channels.remove(&channel) {
            return Ok(false);
        }
        state.leave_room(connection, channel);
        Ok(true)
    }

    /// Returns `true` when the connection has joined `channel`.
    #[must_use]
    pub fn is_member(&self, connection: ConnectionId, channel: Channel) -> bool {
        self.lock()
            .rooms
            .get(&channel)
            .is_some_and(|room| room.members.contains(&connection))
    }

    /// Returns the connections joined to `channel`.
    #[must_use]
    pub fn members(&self, channel: Channel) -> Vec<ConnectionId> {
        self.lock()
            .rooms
            .get(&channel)
            .map(|room| room.members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the number of rooms with at least one member.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    /// Returns the number of registered connections bound to `user`,
    /// including closed ones awaiting [`RoomRegistry::unregister`].
    #[must_use]
    pub fn connection_count(&self, user: UserId) -> usize {
        self.lock().live_connections_of(user)
    }

    /// Removes the connection from every channel.
    ///
    /// Returns `None` when the connection was already gone.
    pub fn unregister(&self, connection: ConnectionId) -> Option<DisconnectedSession> {
        let mut state = self.lock();
        let session = state.remove_session(connection)?;
        let last_connection = session
            .user
            .is_some_and(|user| state.live_connections_of(user) == 0);
        Some(DisconnectedSession {
            user: session.user,
            channels: session.channels.into_iter().collect(),
            last_connection,
        })
    }

    /// Fans `event` out to every member of its channel except the origin.
    ///
    /// Closed connections are pruned from every room and fan-out continues;
    /// they stay registered until unregistered.
    pub fn deliver(&self, event: OutboundEvent, occurred_at: DateTime<Utc>) -> DeliveryReport {
        let mut state = self.lock();
        let Some(room) = state.rooms.get_mut(&event.channel) else {
            return DeliveryReport::default();
        };
        room.next_sequence = room.next_sequence.saturating_add(1);
        let delivered_event = DeliveredEvent {
            event_id: EventId::new(),
            sequence: room.next_sequence,
            channel: event.channel,
            event: event.kind,
            payload: event.payload,
            occurred_at,
        };
        let recipients: Vec<ConnectionId> = room
            .members
            .iter()
            .copied()
            .filter(|member| Some(*member) != event.origin)
            .collect();

        let mut report = DeliveryReport::default();
        let mut closed = Vec::new();
        for connection in recipients {
            let Some(session) = state.sessions.get(&connection) else {
                closed.push(connection);
                continue;
            };
            match session
                .sender
                .send(ServerFrame::Event(delivered_event.clone()))
            {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(_) => {
                    warn!(
                        connection_id = %connection,
                        channel = %event.channel,
                        "delivery to closed connection failed; pruning"
                    );
                    closed.push(connection);
                }
            }
        }
        for connection in closed {
            if !state.close_session(connection) {
                state.leave_room(connection, event.channel);
            }
            report.pruned = report.pruned.saturating_add(1);
        }
        report
    }
}
