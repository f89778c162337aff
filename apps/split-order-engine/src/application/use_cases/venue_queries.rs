//! Venue Queries Use Case
//!
//! Pass-through listings and single-order operations, plus statistics that
//! combine the account with the registry.

use std::sync::Arc;

use crate::application::dto::{StatsDto, VenueOrderDto};
use crate::application::ports::{GatewayError, GatewayPort, VenueSnapshot};
use crate::domain::shared::Ticket;
use crate::domain::split_order::GroupRegistry;

/// Use case for venue listings and single-ticket commands.
pub struct VenueQueriesUseCase<G>
where
    G: GatewayPort,
{
    gateway: Arc<G>,
}

impl<G> VenueQueriesUseCase<G>
where
    G: GatewayPort,
{
    /// Create a new `VenueQueriesUseCase`.
    pub const fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Every open position with parsed group metadata.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the venue cannot be enumerated.
    pub async fn positions(&self) -> Result<Vec<VenueOrderDto>, GatewayError> {
        let positions = self.gateway.positions().await?;
        Ok(positions.into_iter().map(VenueOrderDto::from).collect())
    }

    /// Every pending order with parsed group metadata.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the venue cannot be enumerated.
    pub async fn orders(&self) -> Result<Vec<VenueOrderDto>, GatewayError> {
        let orders = self.gateway.pending_orders().await?;
        Ok(orders.into_iter().map(VenueOrderDto::from).collect())
    }

    /// Cancel a pending order.
    ///
    /// A cancelled leg is picked up as gone by the next trailing scan.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the venue refuses.
    pub async fn delete_order(&self, ticket: Ticket) -> Result<(), GatewayError> {
        self.gateway.cancel_order(ticket).await?;
        tracing::info!(ticket = %ticket, "Pending order cancelled");
        Ok(())
    }

    /// Close an open position.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the venue refuses.
    pub async fn close_position(&self, ticket: Ticket) -> Result<(), GatewayError> {
        self.gateway.close_position(ticket).await?;
        tracing::info!(ticket = %ticket, "Position closed");
        Ok(())
    }

    /// Account figures plus engine counters.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the venue cannot be read.
    pub async fn stats(&self, registry: &GroupRegistry) -> Result<StatsDto, GatewayError> {
        let account = self.gateway.account().await?;
        let snapshot = VenueSnapshot::capture(self.gateway.as_ref()).await?;

        let live_legs = registry
            .iter()
            .flat_map(|group| group.legs().iter())
            .filter(|leg| snapshot.leg_state(leg.ticket).is_live())
            .count();

        Ok(StatsDto {
            balance: account.balance,
            equity: account.equity,
            margin: account.margin,
            free_margin: account.free_margin,
            profit: account.profit,
            tracked_groups: registry.len(),
            groups_past_tp2: registry.tp2_reached_count(),
            live_legs,
            positions_count: snapshot.position_count(),
            orders_count: snapshot.pending_count(),
        })
    }
}
