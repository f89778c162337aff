//! Trail Stops Use Case
//!
//! Once the TP2 leg of a group is no longer live, the stop-loss of the TP3..TP5
//! legs is ratcheted to the TP1 price. Each group is promoted at most once.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::application::ports::{GatewayError, GatewayPort, LegState, VenueSnapshot};
use crate::domain::shared::GroupId;
use crate::domain::split_order::{Direction, GroupRegistry, LegIndex};
use crate::observability::{record_breakeven_promotion, record_modify_failure, set_groups_tracked};

/// Result of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrailOutcome {
    /// Groups promoted to breakeven in this scan.
    pub promoted: Vec<GroupId>,
    /// Groups removed because no leg is live.
    pub removed: Vec<GroupId>,
    /// Stop-loss modifications accepted by the venue.
    pub stops_moved: usize,
    /// Stop-loss modifications rejected by the venue.
    pub modify_failures: usize,
}

enum StopMove {
    Moved,
    Kept,
    Failed,
}

/// Use case for the breakeven trailing scan.
pub struct TrailStopsUseCase<G>
where
    G: GatewayPort,
{
    gateway: Arc<G>,
}

impl<G> TrailStopsUseCase<G>
where
    G: GatewayPort,
{
    /// Create a new `TrailStopsUseCase`.
    pub const fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Enumerate the venue once and scan every tracked group.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the venue cannot be enumerated; the
    /// registry is left unchanged in that case.
    pub async fn execute(
        &self,
        registry: &mut GroupRegistry,
    ) -> Result<TrailOutcome, GatewayError> {
        if registry.is_empty() {
            return Ok(TrailOutcome::default());
        }
        let snapshot = VenueSnapshot::capture(self.gateway.as_ref()).await?;
        Ok(self.apply(registry, &snapshot).await)
    }

    /// Scan every tracked group against a snapshot.
    pub async fn apply(
        &self,
        registry: &mut GroupRegistry,
        snapshot: &VenueSnapshot,
    ) -> TrailOutcome {
        let mut outcome = TrailOutcome::default();

        for group_id in registry.ids() {
            let Some(group) = registry.get_mut(&group_id) else {
                continue;
            };

            for index in LegIndex::ALL {
                if !snapshot.leg_state(group.ticket(index)).is_live() && group.release_leg(index) {
                    tracing::debug!(group_id = %group_id, leg = %index, "Leg no longer live");
                }
            }

            if group.legs().iter().all(|leg| leg.ticket.is_none()) {
                registry.remove(&group_id);
                tracing::info!(group_id = %group_id, "All legs resolved, group removed");
                outcome.removed.push(group_id);
                continue;
            }

            // an empty TP2 slot reads as closed, whether it was hit or never placed
            if group.tp2_reached() || group.ticket(LegIndex::TP2).is_some() {
                continue;
            }

            let target = group.breakeven_price();
            let direction = group.direction();
            let tickets = LegIndex::TRAILED.map(|index| (index, group.ticket(index)));

            for (index, ticket) in tickets {
                match self.move_stop(snapshot.leg_state(ticket), direction, target).await {
                    StopMove::Moved => outcome.stops_moved += 1,
                    StopMove::Kept => {}
                    StopMove::Failed => {
                        outcome.modify_failures += 1;
                        tracing::warn!(
                            group_id = %group_id,
                            leg = %index,
                            "Breakeven stop not applied, not retried"
                        );
                    }
                }
            }

            if group.mark_tp2_reached() {
                record_breakeven_promotion();
                tracing::info!(
                    group_id = %group_id,
                    breakeven = %target,
                    "TP2 closed, remaining legs moved to breakeven"
                );
                outcome.promoted.push(group_id);
            }
        }

        if !outcome.removed.is_empty() {
            set_groups_tracked(registry.len());
        }
        outcome
    }

    async fn move_stop(
        &self,
        state: LegState<'_>,
        direction: Direction,
        target: Decimal,
    ) -> StopMove {
        let (order, result) = match state {
            LegState::Gone => return StopMove::Kept,
            LegState::Pending(order) | LegState::Position(order)
                if order
                    .stop_loss()
                    .is_some_and(|current| !direction.is_improvement(target, current)) =>
            {
                return StopMove::Kept;
            }
            LegState::Pending(order) => (
                order,
                self.gateway
                    .modify_pending(order.ticket, order.price, target, order.take_profit)
                    .await,
            ),
            LegState::Position(order) => (
                order,
                self.gateway
                    .modify_position(order.ticket, target, order.take_profit)
                    .await,
            ),
        };

        match result {
            Ok(()) => {
                tracing::debug!(ticket = %order.ticket, stop_loss = %target, "Stop-loss moved");
                StopMove::Moved
            }
            Err(e) => {
                record_modify_failure("trail");
                tracing::warn!(ticket = %order.ticket, error = %e, "Stop-loss modify rejected");
                StopMove::Failed
            }
        }
    }
}
