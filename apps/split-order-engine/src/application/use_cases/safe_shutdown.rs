//! Safe Shutdown Use Case
//!
//! For every group not yet past TP2, the take-profit of legs TP2..TP5 is
//! collapsed to the TP2 price so the remaining exposure is bounded without a
//! running monitor. TP1 and the TP2 flag are never touched.

use std::sync::Arc;

use crate::application::dto::{GroupShutdownEntry, SafeShutdownReport};
use crate::application::ports::{GatewayError, GatewayPort, LegState, VenueSnapshot};
use crate::domain::split_order::{GroupRegistry, LegIndex};
use crate::observability::record_modify_failure;

/// Use case for the safe-shutdown consolidation.
pub struct SafeShutdownUseCase<G>
where
    G: GatewayPort,
{
    gateway: Arc<G>,
}

impl<G> SafeShutdownUseCase<G>
where
    G: GatewayPort,
{
    /// Create a new `SafeShutdownUseCase`.
    pub const fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Consolidate every unprotected group.
    ///
    /// Re-running it re-applies the same take-profit; the repeated modifies
    /// are counted again in the report.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the venue cannot be enumerated.
    pub async fn execute(
        &self,
        registry: &mut GroupRegistry,
    ) -> Result<SafeShutdownReport, GatewayError> {
        let snapshot = VenueSnapshot::capture(self.gateway.as_ref()).await?;
        let mut report = SafeShutdownReport::default();

        for group_id in registry.ids() {
            let Some(group) = registry.get_mut(&group_id) else {
                continue;
            };
            if group.tp2_reached() {
                continue;
            }

            let target = group.ladder_take_profit(LegIndex::TP2);
            let mut entry = GroupShutdownEntry {
                group_id: group_id.clone(),
                take_profit: target,
                pending_modified: 0,
                positions_modified: 0,
                failures: 0,
            };

            for index in LegIndex::CONSOLIDATED {
                let (is_pending, result) = match snapshot.leg_state(group.ticket(index)) {
                    LegState::Pending(order) => (
                        true,
                        self.gateway
                            .modify_pending(order.ticket, order.price, order.stop_loss, target)
                            .await,
                    ),
                    LegState::Position(position) => (
                        false,
                        self.gateway
                            .modify_position(position.ticket, position.stop_loss, target)
                            .await,
                    ),
                    LegState::Gone => continue,
                };

                match result {
                    Ok(()) => {
                        group.set_take_profit(index, target);
                        if is_pending {
                            entry.pending_modified += 1;
                        } else {
                            entry.positions_modified += 1;
                        }
                    }
                    Err(e) => {
                        record_modify_failure("safe_shutdown");
                        tracing::warn!(
                            group_id = %group_id,
                            leg = %index,
                            error = %e,
                            "Take-profit consolidation rejected"
                        );
                        entry.failures += 1;
                    }
                }
            }

            if entry.pending_modified + entry.positions_modified > 0 {
                report.groups_modified += 1;
                report.pending_modified += entry.pending_modified;
                report.positions_modified += entry.positions_modified;
                report.groups.push(entry);
            }
        }

        tracing::info!(
            groups = report.groups_modified,
            pending = report.pending_modified,
            positions = report.positions_modified,
            "Safe shutdown applied"
        );
        Ok(report)
    }
}
