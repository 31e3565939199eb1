//! Composition root wiring the in-memory marketplace.
//!
//! [`Marketplace`] builds every adapter, the event bus, the real-time
//! gateway, both services and the expiry scheduler from a
//! [`MarketplaceConfig`]. A transport layer only needs the handles it
//! exposes.

use crate::chat::{
    adapters::memory::{InMemoryAttachmentStore, InMemoryChatMessageRepository},
    services::ChatService,
};
use crate::config::{ConfigError, MarketplaceConfig};
use crate::marketplace::{
    adapters::memory::{InMemoryBidRepository, InMemoryTaskRepository, InMemoryUserStatsRepository},
    services::{BidExpiryScheduler, TaskLifecycleService},
};
use crate::realtime::{
    adapters::{StaticTokenVerifier, TaskChannelAccess},
    ports::{EventPublisher, TokenVerifier},
    services::{InMemoryEventBus, RealtimeGateway, RoomRegistry, TypingTracker},
};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Task lifecycle service over the in-memory stores.
pub type InMemoryLifecycle<C> = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryBidRepository,
    InMemoryUserStatsRepository,
    C,
>;

/// Chat service over the in-memory stores.
pub type InMemoryChat<C> =
    ChatService<InMemoryTaskRepository, InMemoryChatMessageRepository, InMemoryAttachmentStore, C>;

/// Expiry scheduler over the in-memory stores.
pub type InMemoryScheduler<C> = BidExpiryScheduler<
    InMemoryTaskRepository,
    InMemoryBidRepository,
    InMemoryUserStatsRepository,
    C,
>;

/// A fully wired single-process marketplace.
pub struct Marketplace<C = DefaultClock>
where
    C: Clock + Send + Sync + 'static,
{
    lifecycle: Arc<InMemoryLifecycle<C>>,
    chat: Arc<InMemoryChat<C>>,
    gateway: RealtimeGateway,
    registry: Arc<RoomRegistry>,
    tokens: Arc<StaticTokenVerifier>,
    attachments: Arc<InMemoryAttachmentStore>,
    scheduler: Arc<InMemoryScheduler<C>>,
    clock: Arc<C>,
}

impl Marketplace<DefaultClock> {
    /// Builds a marketplace reading the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the configuration is invalid.
    pub fn from_config(config: &MarketplaceConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(DefaultClock))
    }
}

impl<C> Marketplace<C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Builds a marketplace reading time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the configuration is invalid.
    pub fn with_clock(config: &MarketplaceConfig, clock: Arc<C>) -> Result<Self, ConfigError> {
        config.validate()?;
        let rules = config.marketplace_rules()?;

        let tasks = Arc::new(InMemoryTaskRepository::new());
        let bids = Arc::new(InMemoryBidRepository::new());
        let stats = Arc::new(InMemoryUserStatsRepository::new());
        let messages = Arc::new(InMemoryChatMessageRepository::new());
        let attachments = Arc::new(InMemoryAttachmentStore::new());

        let registry = Arc::new(RoomRegistry::new());
        let publisher: Arc<dyn EventPublisher> =
            Arc::new(InMemoryEventBus::new(Arc::clone(&registry), Arc::clone(&clock)));
        let typing = TypingTracker::new(config.typing_ttl(), Arc::clone(&publisher));
        let tokens = Arc::new(StaticTokenVerifier::new());
        let verifier: Arc<dyn TokenVerifier> = Arc::<StaticTokenVerifier>::clone(&tokens);
        let gateway = RealtimeGateway::new(
            Arc::clone(&registry),
            Arc::clone(&publisher),
            typing,
            verifier,
            Arc::new(TaskChannelAccess::new(Arc::clone(&tasks))),
        );

        let lifecycle = Arc::new(
            TaskLifecycleService::new(
                Arc::clone(&tasks),
                bids,
                stats,
                Arc::clone(&publisher),
                Arc::clone(&clock),
            )
            .with_rules(rules),
        );
        let chat = Arc::new(
            ChatService::new(
                tasks,
                messages,
                Arc::clone(&attachments),
                publisher,
                Arc::clone(&clock),
            )
            .with_rules(config.chat_rules()),
        );
        let scheduler = Arc::new(BidExpiryScheduler::new(
            Arc::clone(&lifecycle),
            config.sweep_interval(),
        ));

        Ok(Self {
            lifecycle,
            chat,
            gateway,
            registry,
            tokens,
            attachments,
            scheduler,
            clock,
        })
    }

    /// Returns the task and bid service.
    #[must_use]
    pub const fn lifecycle(&self) -> &Arc<InMemoryLifecycle<C>> {
        &self.lifecycle
    }

    /// Returns the chat service.
    #[must_use]
    pub const fn chat(&self) -> &Arc<InMemoryChat<C>> {
        &self.chat
    }

    /// Returns the connection gateway.
    #[must_use]
    pub const fn gateway(&self) -> &RealtimeGateway {
        &self.gateway
    }

    /// Returns the room registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Returns the token verifier so sessions can be issued.
    #[must_use]
    pub const fn tokens(&self) -> &Arc<StaticTokenVerifier> {
        &self.tokens
    }

    /// Returns the attachment store.
    #[must_use]
    pub const fn attachments(&self) -> &Arc<InMemoryAttachmentStore> {
        &self.attachments
    }

    /// Returns the expiry scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &Arc<InMemoryScheduler<C>> {
        &self.scheduler
    }

    /// Returns the clock shared by every service.
    #[must_use]
    pub const fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    /// Starts the expiry scheduler until `shutdown` is cancelled.
    #[must_use]
    pub fn spawn_scheduler(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        Arc::clone(&self.scheduler).spawn(shutdown)
    }
}
