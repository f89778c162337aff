//! Split Order Engine
//!
//! The single consumer that owns the group registry. Market updates, scan
//! ticks and command polls are handled one at a time on this loop, so the
//! registry needs no lock; a slow venue call delays everything queued behind
//! it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::dto::{Command, CommandResponse, ResponseData};
use crate::application::ports::{ChannelError, CommandChannelPort, GatewayPort, MarketFeedPort};
use crate::application::use_cases::{
    PlaceSplitOrderUseCase, PlacementSettings, RecoverGroupsUseCase, RecoveryReport,
    SafeShutdownUseCase, TrailOutcome, TrailStopsUseCase, VenueQueriesUseCase,
};
use crate::domain::split_order::{GroupRegistry, SymbolTable};
use crate::observability::record_command;

/// Loop timing.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Fallback trailing scan period when no market update arrives.
    pub scan_interval: Duration,
    /// Period between command polls.
    pub command_poll_interval: Duration,
    /// Bounded wait for a command inside one poll.
    pub command_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_millis(500),
            command_poll_interval: Duration::from_millis(100),
            command_timeout: Duration::from_millis(50),
        }
    }
}

/// Event loop tying the command channel and market feed to the use cases.
pub struct SplitOrderEngine<G, C, F>
where
    G: GatewayPort,
    C: CommandChannelPort,
    F: MarketFeedPort,
{
    registry: GroupRegistry,
    channel: Arc<C>,
    feed: Arc<F>,
    settings: EngineSettings,
    place: PlaceSplitOrderUseCase<G>,
    trail: TrailStopsUseCase<G>,
    recover: RecoverGroupsUseCase<G>,
    safe_shutdown: SafeShutdownUseCase<G>,
    queries: VenueQueriesUseCase<G>,
}

impl<G, C, F> SplitOrderEngine<G, C, F>
where
    G: GatewayPort,
    C: CommandChannelPort,
    F: MarketFeedPort,
{
    /// Create an engine with an empty registry.
    pub fn new(
        gateway: Arc<G>,
        channel: Arc<C>,
        feed: Arc<F>,
        symbols: SymbolTable,
        placement: PlacementSettings,
        settings: EngineSettings,
    ) -> Self {
        let magic = placement.magic;
        Self {
            registry: GroupRegistry::new(),
            channel,
            feed,
            settings,
            place: PlaceSplitOrderUseCase::new(Arc::clone(&gateway), symbols.clone(), placement),
            trail: TrailStopsUseCase::new(Arc::clone(&gateway)),
            recover: RecoverGroupsUseCase::new(Arc::clone(&gateway), symbols, magic),
            safe_shutdown: SafeShutdownUseCase::new(Arc::clone(&gateway)),
            queries: VenueQueriesUseCase::new(gateway),
        }
    }

    /// The tracked groups.
    #[must_use]
    pub const fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    /// Rebuild the registry from the venue.
    ///
    /// A venue failure is logged and leaves the registry as it was.
    pub async fn recover(&mut self) -> Option<RecoveryReport> {
        match self.recover.execute(&mut self.registry).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, "Recovery failed, starting with an empty registry");
                None
            }
        }
    }

    /// Run one trailing scan.
    pub async fn scan(&mut self) -> Option<TrailOutcome> {
        match self.trail.execute(&mut self.registry).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(error = %e, "Trailing scan skipped, venue unavailable");
                None
            }
        }
    }

    /// Parse and execute one complete command frame.
    pub async fn handle(&mut self, body: &str) -> CommandResponse {
        let response = match Command::parse(body) {
            Ok(command) => self.dispatch(command).await,
            Err(e) => {
                tracing::warn!(error = %e, "Command rejected");
                CommandResponse::failure(e.action_name(), e.to_string())
            }
        };

        let result = if response.success { "success" } else { "failure" };
        record_command(&response.action, result);
        response
    }

    /// Wait up to the command timeout for one command and answer it.
    ///
    /// Returns whether a command was handled.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` if the channel is disconnected; no state changes.
    pub async fn poll_command(&mut self) -> Result<bool, ChannelError> {
        let Some(command) = self.channel.receive(self.settings.command_timeout).await? else {
            return Ok(false);
        };

        tracing::debug!(request_id = %command.id, "Command received");
        let response = self.handle(&command.body).await;
        if let Err(e) = self.channel.reply(&command.id, &response).await {
            tracing::warn!(request_id = %command.id, error = %e, "Reply not delivered");
        }
        Ok(true)
    }

    /// Run until `shutdown` is cancelled and hand back the registry.
    ///
    /// Recovery runs once before any other event is processed.
    pub async fn run(mut self, shutdown: CancellationToken) -> GroupRegistry {
        self.recover().await;

        let mut updates = self.feed.market_updates();
        let mut feed_open = true;
        let mut scan_tick = tokio::time::interval(self.settings.scan_interval);
        scan_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut poll_tick = tokio::time::interval(self.settings.command_poll_interval);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(groups = self.registry.len(), "Split order engine running");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("Split order engine shutting down");
                    break;
                }
                update = updates.recv(), if feed_open => {
                    match update {
                        Ok(_) => {
                            self.scan().await;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "Market feed lagged, scanning once");
                            self.scan().await;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::warn!("Market feed closed, scanning on timer only");
                            feed_open = false;
                        }
                    }
                }
                _ = scan_tick.tick() => {
                    self.scan().await;
                }
                _ = poll_tick.tick() => {
                    if let Err(e) = self.poll_command().await {
                        tracing::debug!(error = %e, "Command poll ended without progress");
                    }
                }
            }
        }

        self.registry
    }

    async fn dispatch(&mut self, command: Command) -> CommandResponse {
        let action = command.action();
        let result = match command {
            Command::PlaceOrder(request) => self
                .place
                .execute(&mut self.registry, request)
                .await
                .map(ResponseData::PlacedOrder)
                .map_err(|e| e.to_string()),
            Command::GetPositions => self
                .queries
                .positions()
                .await
                .map(|positions| ResponseData::Positions { positions })
                .map_err(|e| e.to_string()),
            Command::GetOrders => self
                .queries
                .orders()
                .await
                .map(|orders| ResponseData::Orders { orders })
                .map_err(|e| e.to_string()),
            Command::DeleteOrder(ticket) => self
                .queries
                .delete_order(ticket)
                .await
                .map(|()| ResponseData::Ticket { ticket })
                .map_err(|e| e.to_string()),
            Command::ClosePosition(ticket) => self
                .queries
                .close_position(ticket)
                .await
                .map(|()| ResponseData::Ticket { ticket })
                .map_err(|e| e.to_string()),
            Command::GetStats => self
                .queries
                .stats(&self.registry)
                .await
                .map(ResponseData::Stats)
                .map_err(|e| e.to_string()),
            Command::SafeShutdown => self
                .safe_shutdown
                .execute(&mut self.registry)
                .await
                .map(|safe_shutdown| ResponseData::SafeShutdown { safe_shutdown })
                .map_err(|e| e.to_string()),
        };

        match result {
            Ok(data) => CommandResponse::ok(action, data),
            Err(error) => {
                tracing::warn!(action = %action, %error, "Command failed");
                CommandResponse::failure(action.as_str(), error)
            }
        }
    }
}
