//! Shared helpers for in-memory integration tests.

use bidboard::{
    app::Marketplace,
    clock::ManualClock,
    config::MarketplaceConfig,
    marketplace::{
        domain::{Bid, TaskId, TaskView, UserId},
        services::{CreateTaskRequest, PlaceBidRequest},
    },
    realtime::domain::{
        Channel, ClientCommand, ConnectionId, DeliveredEvent, EventKind, ServerFrame,
    },
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Instant every campus clock starts at.
#[must_use]
pub fn term_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 14, 8, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// A marketplace on a settable clock.
pub struct Campus {
    pub market: Marketplace<ManualClock>,
    pub clock: ManualClock,
}

impl Campus {
    /// Builds a campus from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid.
    pub fn with_config(config: &MarketplaceConfig) -> eyre::Result<Self> {
        let clock = ManualClock::new(term_start());
        let market = Marketplace::with_clock(config, Arc::new(clock.clone()))?;
        Ok(Self { market, clock })
    }

    /// Posts an errand due in three days.
    ///
    /// # Errors
    ///
    /// Returns an error when the service refuses the task.
    pub async fn post_task(&self, poster: UserId, budget: (u32, u32)) -> eyre::Result<TaskView> {
        let request = CreateTaskRequest::new(
            poster,
            "Collect a parcel from the post room",
            "Small box, needs a signature. Bring it to Hall B room 204.",
            "errands",
            budget,
            self.clock.utc() + Duration::days(3),
        );
        Ok(self.market.lifecycle().create_task(request).await?)
    }

    /// Places a bid.
    ///
    /// # Errors
    ///
    /// Returns an error when the service refuses the bid.
    pub async fn bid(&self, task_id: TaskId, bidder: UserId, amount: u32) -> eyre::Result<Bid> {
        let request = PlaceBidRequest::new(task_id, bidder, amount, "within the hour");
        Ok(self.market.lifecycle().place_bid(request).await?)
    }

    /// Posts a task and assigns it to `helper`.
    ///
    /// # Errors
    ///
    /// Returns an error when any step is refused.
    pub async fn assigned_task(&self, poster: UserId, helper: UserId) -> eyre::Result<TaskId> {
        let task_id = self.post_task(poster, (100, 300)).await?.task.id();
        let bid = self.bid(task_id, helper, 150).await?;
        self.market
            .lifecycle()
            .accept_bid(task_id, bid.id(), poster)
            .await?;
        Ok(task_id)
    }

    /// Opens a connection and authenticates it as `user`.
    ///
    /// # Errors
    ///
    /// Returns an error when authentication is refused.
    pub async fn connect_as(&self, user: UserId) -> eyre::Result<Client> {
        let token = format!("session-{user}");
        self.market.tokens().issue(token.clone(), user);
        let (connection, frames) = self.market.gateway().connect();
        let reply = self
            .market
            .gateway()
            .handle(connection, ClientCommand::Authenticate { token })
            .await?;
        eyre::ensure!(reply == ServerFrame::Authenticated { user_id: user });
        Ok(Client {
            connection,
            frames,
        })
    }

    /// Joins `client` to a task room.
    ///
    /// # Errors
    ///
    /// Returns an error when the join is refused.
    pub async fn join_task(&self, client: &Client, task_id: TaskId) -> eyre::Result<()> {
        self.market
            .gateway()
            .handle(
                client.connection,
                ClientCommand::JoinChannel {
                    channel: Channel::Task(task_id),
                },
            )
            .await?;
        Ok(())
    }
}

/// Builds a campus with the default configuration.
#[fixture]
pub fn campus() -> Campus {
    Campus::with_config(&MarketplaceConfig::default()).expect("default configuration is valid")
}

/// A live authenticated connection.
pub struct Client {
    pub connection: ConnectionId,
    pub frames: UnboundedReceiver<ServerFrame>,
}

impl Client {
    /// Takes every event delivered so far.
    pub fn drain(&mut self) -> Vec<DeliveredEvent> {
        let mut events = Vec::new();
        while let Ok(frame) = self.frames.try_recv() {
            if let ServerFrame::Event(event) = frame {
                events.push(event);
            }
        }
        events
    }

    /// Takes every delivered event of `kind`.
    pub fn drain_kind(&mut self, kind: EventKind) -> Vec<DeliveredEvent> {
        self.drain()
            .into_iter()
            .filter(|event| event.event == kind)
            .collect()
    }
}
