//! Recover Groups Use Case
//!
//! Rebuilds the registry from what the venue shows: every live order carrying
//! our marker and a leg tag is clustered by group id. Orders without a usable
//! tag are skipped and left to expire on their own.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use crate::application::ports::{GatewayError, GatewayPort, VenueOrder};
use crate::domain::shared::GroupId;
use crate::domain::split_order::{
    GroupRegistry, LegIndex, NewGroup, OrderKind, SplitOrderGroup, SymbolTable,
};
use crate::observability::set_groups_tracked;

/// Summary of a recovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Groups added to the registry.
    pub groups: usize,
    /// Legs attached to those groups.
    pub legs: usize,
    /// Orders carrying our marker that could not be attached.
    pub skipped: usize,
    /// Groups inferred to be past TP2.
    pub tp2_inferred: usize,
}

/// Use case for rebuilding the registry from venue state.
pub struct RecoverGroupsUseCase<G>
where
    G: GatewayPort,
{
    gateway: Arc<G>,
    symbols: SymbolTable,
    magic: u64,
}

impl<G> RecoverGroupsUseCase<G>
where
    G: GatewayPort,
{
    /// Create a new `RecoverGroupsUseCase`.
    pub const fn new(gateway: Arc<G>, symbols: SymbolTable, magic: u64) -> Self {
        Self {
            gateway,
            symbols,
            magic,
        }
    }

    /// Enumerate the venue and add every recoverable group.
    ///
    /// Pending orders are read before positions so a group is seeded from its
    /// exact pending entry price when one exists. Groups already tracked are
    /// left as they are.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the venue cannot be enumerated.
    pub async fn execute(
        &self,
        registry: &mut GroupRegistry,
    ) -> Result<RecoveryReport, GatewayError> {
        let pending = self.gateway.pending_orders().await?;
        let positions = self.gateway.positions().await?;

        let report = self.rebuild(registry, pending.into_iter().chain(positions));
        set_groups_tracked(registry.len());
        tracing::info!(
            groups = report.groups,
            legs = report.legs,
            skipped = report.skipped,
            tp2_inferred = report.tp2_inferred,
            "Registry recovered from venue"
        );
        Ok(report)
    }

    fn rebuild(
        &self,
        registry: &mut GroupRegistry,
        orders: impl IntoIterator<Item = VenueOrder>,
    ) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        let mut groups: BTreeMap<GroupId, SplitOrderGroup> = BTreeMap::new();

        for order in orders {
            if order.magic != self.magic {
                continue;
            }
            let Some(tag) = order.leg_tag() else {
                tracing::debug!(
                    ticket = %order.ticket,
                    comment = %order.comment,
                    "No leg tag, skipped"
                );
                report.skipped += 1;
                continue;
            };

            let group = match groups.entry(tag.group_id.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let Some(spec) = self.symbols.get(&order.symbol) else {
                        tracing::warn!(
                            ticket = %order.ticket,
                            symbol = %order.symbol,
                            group_id = %tag.group_id,
                            "Tagged order on unconfigured symbol, skipped"
                        );
                        report.skipped += 1;
                        continue;
                    };
                    let order_kind = order
                        .kind
                        .pending_kind()
                        .unwrap_or_else(|| OrderKind::limit_for(order.kind.direction()));
                    entry.insert(SplitOrderGroup::new(NewGroup {
                        id: tag.group_id.clone(),
                        symbol: order.symbol.clone(),
                        order_kind,
                        entry_price: order.price,
                        pip_value: spec.pip_value,
                        created_at: order.opened_at,
                    }))
                }
            };

            if let Some(existing) = group.ticket(tag.leg) {
                tracing::debug!(
                    group_id = %tag.group_id,
                    leg = %tag.leg,
                    kept = %existing,
                    ignored = %order.ticket,
                    "Duplicate leg tag, skipped"
                );
                report.skipped += 1;
                continue;
            }
            group.attach_leg(tag.leg, order.ticket, order.volume, order.take_profit);
            report.legs += 1;
        }

        for (group_id, mut group) in groups {
            if registry.get(&group_id).is_some() {
                continue;
            }
            // An empty TP2 slot cannot tell "hit" from "never placed"; both read as hit.
            let tp2_missing = group.ticket(LegIndex::TP2).is_none();
            let trailed_live = LegIndex::TRAILED
                .iter()
                .any(|index| group.ticket(*index).is_some());
            if tp2_missing && trailed_live {
                group.mark_tp2_reached();
                report.tp2_inferred += 1;
            }
            tracing::debug!(
                group_id = %group_id,
                legs = group.placed_count(),
                tp2_reached = group.tp2_reached(),
                "Group recovered"
            );
            registry.insert(group);
            report.groups += 1;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::VenueOrderKind;
    use crate::domain::shared::{Symbol, Ticket};
    use crate::domain::split_order::{Direction, LegTag, SymbolSpec};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const MAGIC: u64 = 20_250_117;

    fn use_case() -> RecoverGroupsUseCase<crate::infrastructure::gateway::PaperGateway> {
        let symbols = SymbolTable::new().with(
            "XAUUSD",
            SymbolSpec {
                pip_value: dec!(0.10),
                lot_step: dec!(0.01),
                min_volume: dec!(0.01),
                max_volume: dec!(50),
                digits: 2,
            },
        );
        let gateway = Arc::new(crate::infrastructure::gateway::PaperGateway::new(symbols.clone()));
        RecoverGroupsUseCase::new(gateway, symbols, MAGIC)
    }

    fn venue_order(ticket: u64, kind: VenueOrderKind, price: Decimal, comment: &str) -> VenueOrder {
        VenueOrder {
            ticket: Ticket::from_raw(ticket).unwrap(),
            symbol: Symbol::new("XAUUSD"),
            kind,
            volume: dec!(0.01),
            price,
            stop_loss: Decimal::ZERO,
            take_profit: dec!(4107.5),
            profit: Decimal::ZERO,
            comment: comment.to_string(),
            magic: MAGIC,
            tag: None,
            opened_at: Utc::now(),
        }
    }

    #[test]
    fn clusters_by_group_and_slot() {
        let mut registry = GroupRegistry::new();
        let report = use_case().rebuild(
            &mut registry,
            vec![
                venue_order(1, VenueOrderKind::BuyStop, dec!(4100), "split|GROUP:A|TP:1"),
                venue_order(2, VenueOrderKind::BuyStop, dec!(4100), "split|GROUP:A|TP:2"),
                venue_order(3, VenueOrderKind::SellLimit, dec!(4200), "split|GROUP:B|TP:5"),
            ],
        );

        assert_eq!(report.groups, 2);
        assert_eq!(report.legs, 3);
        let a = registry.get(&GroupId::new("A")).unwrap();
        assert_eq!(a.ticket(LegIndex::TP2), Ticket::from_raw(2));
        assert_eq!(a.ticket(LegIndex::TP3), None);
        assert_eq!(a.order_kind(), OrderKind::BuyStop);
        assert!(!a.tp2_reached());

        let b = registry.get(&GroupId::new("B")).unwrap();
        assert_eq!(b.direction(), Direction::Short);
        assert_eq!(b.entry_price(), dec!(4200));
    }

    #[test]
    fn skips_untagged_and_counts_them() {
        let mut registry = GroupRegistry::new();
        let report = use_case().rebuild(
            &mut registry,
            vec![
                venue_order(1, VenueOrderKind::Buy, dec!(4100), "manual"),
                venue_order(2, VenueOrderKind::Buy, dec!(4100), "x|GROUP:A|TP:9"),
            ],
        );
        assert_eq!(report.skipped, 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn ignores_foreign_magic() {
        let mut registry = GroupRegistry::new();
        let mut foreign = venue_order(1, VenueOrderKind::Buy, dec!(4100), "x|GROUP:A|TP:1");
        foreign.magic = 7;
        let report = use_case().rebuild(&mut registry, vec![foreign]);
        assert_eq!(report, RecoveryReport::default());
    }

    #[test]
    fn first_member_seeds_metadata() {
        let mut registry = GroupRegistry::new();
        use_case().rebuild(
            &mut registry,
            vec![
                venue_order(1, VenueOrderKind::BuyLimit, dec!(4100), "x|GROUP:A|TP:2"),
                venue_order(2, VenueOrderKind::Buy, dec!(4100.4), "x|GROUP:A|TP:1"),
            ],
        );
        let group = registry.get(&GroupId::new("A")).unwrap();
        assert_eq!(group.entry_price(), dec!(4100));
        assert_eq!(group.order_kind(), OrderKind::BuyLimit);
    }

    #[test]
    fn position_seeded_group_uses_limit_kind() {
        let mut registry = GroupRegistry::new();
        use_case().rebuild(
            &mut registry,
            vec![venue_order(1, VenueOrderKind::Sell, dec!(4100), "x|GROUP:A|TP:1")],
        );
        let group = registry.get(&GroupId::new("A")).unwrap();
        assert_eq!(group.order_kind(), OrderKind::SellLimit);
    }

    #[test]
    fn missing_tp2_with_trailed_leg_infers_tp2_reached() {
        let mut registry = GroupRegistry::new();
        let report = use_case().rebuild(
            &mut registry,
            vec![
                venue_order(1, VenueOrderKind::Buy, dec!(4100), "x|GROUP:A|TP:1"),
                venue_order(3, VenueOrderKind::Buy, dec!(4100), "x|GROUP:A|TP:3"),
            ],
        );
        assert_eq!(report.tp2_inferred, 1);
        assert!(registry.get(&GroupId::new("A")).unwrap().tp2_reached());
    }

    #[test]
    fn missing_tp2_with_only_tp1_does_not_infer() {
        let mut registry = GroupRegistry::new();
        use_case().rebuild(
            &mut registry,
            vec![venue_order(1, VenueOrderKind::Buy, dec!(4100), "x|GROUP:A|TP:1")],
        );
        assert!(!registry.get(&GroupId::new("A")).unwrap().tp2_reached());
    }

    #[test]
    fn duplicate_slot_keeps_first() {
        let mut registry = GroupRegistry::new();
        let report = use_case().rebuild(
            &mut registry,
            vec![
                venue_order(1, VenueOrderKind::Buy, dec!(4100), "x|GROUP:A|TP:2"),
                venue_order(9, VenueOrderKind::Buy, dec!(4100), "x|GROUP:A|TP:2"),
            ],
        );
        assert_eq!(report.skipped, 1);
        assert_eq!(
            registry.get(&GroupId::new("A")).unwrap().ticket(LegIndex::TP2),
            Ticket::from_raw(1)
        );
    }

    #[test]
    fn structured_tag_is_used_when_present() {
        let mut registry = GroupRegistry::new();
        let mut order = venue_order(4, VenueOrderKind::BuyLimit, dec!(4100), "edited by hand");
        order.tag = Some(LegTag::new(GroupId::new("S"), LegIndex::TP4));
        use_case().rebuild(&mut registry, vec![order]);
        assert_eq!(
            registry.get(&GroupId::new("S")).unwrap().ticket(LegIndex::TP4),
            Ticket::from_raw(4)
        );
    }

    #[test]
    fn already_tracked_group_is_untouched() {
        let mut registry = GroupRegistry::new();
        let recover = use_case();
        recover.rebuild(
            &mut registry,
            vec![venue_order(1, VenueOrderKind::Buy, dec!(4100), "x|GROUP:A|TP:1")],
        );
        registry.get_mut(&GroupId::new("A")).unwrap().mark_tp2_reached();

        let report = recover.rebuild(
            &mut registry,
            vec![venue_order(1, VenueOrderKind::Buy, dec!(4100), "x|GROUP:A|TP:1")],
        );
        assert_eq!(report.groups, 0);
        assert!(registry.get(&GroupId::new("A")).unwrap().tp2_reached());
    }
}
