//! End-to-end lifecycle tests against the paper venue.
//!
//! Each test drives the use cases the way the engine loop does: one
//! registry, one venue, one operation at a time.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use split_order_engine::application::dto::PlaceOrderDto;
use split_order_engine::application::ports::{GatewayPort, VenueOrder, VenueOrderKind};
use split_order_engine::application::use_cases::{
    PlaceSplitOrderUseCase, PlacementSettings, RecoverGroupsUseCase, SafeShutdownUseCase,
    SplitOrderError, TrailStopsUseCase,
};
use split_order_engine::infrastructure::gateway::{ModifyTarget, PaperGateway};
use split_order_engine::{
    GroupId, GroupRegistry, LegIndex, LegTag, OrderKind, Symbol, SymbolSpec, SymbolTable, Ticket,
};

const MAGIC: u64 = 20_250_117;

fn symbols() -> SymbolTable {
    SymbolTable::new().with(
        "XAUUSD",
        SymbolSpec {
            pip_value: dec!(0.10),
            lot_step: dec!(0.01),
            min_volume: dec!(0.01),
            max_volume: dec!(50),
            digits: 2,
        },
    )
}

struct Harness {
    gateway: Arc<PaperGateway>,
    registry: GroupRegistry,
    place: PlaceSplitOrderUseCase<PaperGateway>,
    trail: TrailStopsUseCase<PaperGateway>,
    shutdown: SafeShutdownUseCase<PaperGateway>,
}

impl Harness {
    fn new() -> Self {
        Self::with_gateway(PaperGateway::new(symbols()).with_balance(dec!(10000)))
    }

    fn with_gateway(gateway: PaperGateway) -> Self {
        let gateway = Arc::new(gateway);
        gateway.set_quote("XAUUSD", dec!(4095.0), dec!(4095.2));
        Self {
            place: PlaceSplitOrderUseCase::new(
                Arc::clone(&gateway),
                symbols(),
                PlacementSettings {
                    magic: MAGIC,
                    comment_prefix: "split".to_string(),
                    default_deviation: 3,
                    default_lot_size: dec!(0.1),
                },
            ),
            trail: TrailStopsUseCase::new(Arc::clone(&gateway)),
            shutdown: SafeShutdownUseCase::new(Arc::clone(&gateway)),
            registry: GroupRegistry::new(),
            gateway,
        }
    }

    fn recover(&self) -> RecoverGroupsUseCase<PaperGateway> {
        RecoverGroupsUseCase::new(Arc::clone(&self.gateway), symbols(), MAGIC)
    }

    async fn place_group(&mut self, request: PlaceOrderDto) -> GroupId {
        let outcome = self.place.execute(&mut self.registry, request).await.unwrap();
        outcome.group_id
    }

    fn tickets(&self, group_id: &GroupId) -> Vec<Option<Ticket>> {
        let group = self.registry.get(group_id).unwrap();
        LegIndex::ALL.iter().map(|leg| group.ticket(*leg)).collect()
    }

    fn fill_all(&self, group_id: &GroupId) {
        for ticket in self.tickets(group_id).into_iter().flatten() {
            self.gateway.fill_pending(ticket).unwrap();
        }
    }

    fn leg_ticket(&self, group_id: &GroupId, leg: LegIndex) -> Ticket {
        self.registry.get(group_id).unwrap().ticket(leg).unwrap()
    }
}

fn buy_stop(price: Decimal) -> PlaceOrderDto {
    PlaceOrderDto {
        order_type: OrderKind::BuyStop,
        symbol: Symbol::new("XAUUSD"),
        price,
        sl: price - dec!(20),
        tp_levels: vec![price + dec!(1.5); 5],
        lot_size: Some(dec!(0.1)),
        deviation: None,
        comment: None,
        magic_number: None,
    }
}

fn sell_limit(price: Decimal) -> PlaceOrderDto {
    PlaceOrderDto {
        order_type: OrderKind::SellLimit,
        sl: price + dec!(20),
        tp_levels: vec![price - dec!(1.5); 5],
        ..buy_stop(price)
    }
}

// ============================================
// Splitter
// ============================================

#[tokio::test]
async fn scenario_a_buy_stop_fans_out_into_ladder() {
    let mut h = Harness::new();
    let outcome = h
        .place
        .execute(&mut h.registry, buy_stop(dec!(4100.0)))
        .await
        .unwrap();

    assert_eq!(outcome.order_kind, OrderKind::BuyStop);
    assert!(!outcome.is_partial());
    let volumes: Vec<Decimal> = outcome.legs.iter().map(|leg| leg.volume).collect();
    assert_eq!(
        volumes,
        vec![dec!(0.06), dec!(0.01), dec!(0.01), dec!(0.01), dec!(0.01)]
    );
    let take_profits: Vec<Decimal> = outcome.legs.iter().map(|leg| leg.take_profit).collect();
    assert_eq!(
        take_profits,
        vec![
            dec!(4101.5),
            dec!(4104.5),
            dec!(4107.5),
            dec!(4110.5),
            dec!(4113.5)
        ]
    );

    for leg in &outcome.legs {
        let order = h.gateway.order(leg.ticket.unwrap()).unwrap();
        assert_eq!(order.kind, VenueOrderKind::BuyStop);
        assert_eq!(order.magic, MAGIC);
        assert_eq!(
            order.comment,
            format!("split|GROUP:{}|TP:{}", outcome.group_id, leg.index.tp_number())
        );
    }

    let group = h.registry.get(&outcome.group_id).unwrap();
    assert!(!group.tp2_reached());
    assert_eq!(group.entry_price(), dec!(4100.0));
    assert!(outcome.group_id.as_str().starts_with("XAUUSD_4100.00_"));
}

#[tokio::test]
async fn passed_stop_is_downgraded_to_limit() {
    let mut h = Harness::new();
    // ask is 4095.2, so a buy stop at 4090 has already been passed
    let outcome = h
        .place
        .execute(&mut h.registry, buy_stop(dec!(4090.0)))
        .await
        .unwrap();

    assert_eq!(outcome.order_kind, OrderKind::BuyLimit);
    let order = h.gateway.order(outcome.ticket).unwrap();
    assert_eq!(order.kind, VenueOrderKind::BuyLimit);
}

#[tokio::test]
async fn scenario_b_partial_failure_keeps_group() {
    let mut h = Harness::new();
    h.gateway.reject_next_opens([1, 3]);

    let outcome = h
        .place
        .execute(&mut h.registry, buy_stop(dec!(4100.0)))
        .await
        .unwrap();

    assert!(outcome.is_partial());
    assert_eq!(outcome.placed_count(), 3);
    assert_eq!(Some(outcome.ticket), outcome.legs[0].ticket);
    assert!(outcome.legs[1].error.is_some());
    assert!(outcome.legs[3].error.is_some());

    let group = h.registry.get(&outcome.group_id).unwrap();
    assert_eq!(group.placed_count(), 3);
    assert!(group.ticket(LegIndex::TP2).is_none());
    assert!(group.ticket(LegIndex::TP4).is_none());
}

#[tokio::test]
async fn first_leg_failure_reports_next_ticket() {
    let mut h = Harness::new();
    h.gateway.reject_next_opens([0]);

    let outcome = h
        .place
        .execute(&mut h.registry, buy_stop(dec!(4100.0)))
        .await
        .unwrap();

    assert_eq!(Some(outcome.ticket), outcome.legs[1].ticket);
}

#[tokio::test]
async fn total_failure_keeps_nothing() {
    let mut h = Harness::new();
    h.gateway.reject_next_opens(0..5);

    let result = h
        .place
        .execute(&mut h.registry, buy_stop(dec!(4100.0)))
        .await;

    let Err(SplitOrderError::TotalExecutionFailure { last_error }) = result else {
        panic!("expected total failure, got {result:?}");
    };
    assert!(last_error.contains("rejected"));
    assert!(h.registry.is_empty());
    assert!(h.gateway.pending_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_symbol_is_rejected_before_any_venue_call() {
    let mut h = Harness::new();
    let request = PlaceOrderDto {
        symbol: Symbol::new("BTCUSD"),
        ..buy_stop(dec!(4100.0))
    };

    let result = h.place.execute(&mut h.registry, request).await;

    assert!(matches!(result, Err(SplitOrderError::Validation(_))));
    assert!(h.gateway.pending_orders().await.unwrap().is_empty());
}

// ============================================
// Trailing Monitor
// ============================================

#[tokio::test]
async fn scenario_c_tp2_close_moves_survivors_to_breakeven_once() {
    let mut h = Harness::new();
    let group_id = h.place_group(buy_stop(dec!(4100.0))).await;
    h.fill_all(&group_id);

    let outcome = h.trail.execute(&mut h.registry).await.unwrap();
    assert!(outcome.promoted.is_empty());
    assert!(h.gateway.modify_calls().is_empty());

    let tp2 = h.leg_ticket(&group_id, LegIndex::TP2);
    h.gateway.hit_take_profit(tp2).unwrap();

    let outcome = h.trail.execute(&mut h.registry).await.unwrap();
    assert_eq!(outcome.promoted, vec![group_id.clone()]);
    assert_eq!(outcome.stops_moved, 3);
    assert!(h.registry.get(&group_id).unwrap().tp2_reached());
    assert_eq!(h.registry.get(&group_id).unwrap().ticket(LegIndex::TP2), None);

    for leg in LegIndex::TRAILED {
        let order = h.gateway.order(h.leg_ticket(&group_id, leg)).unwrap();
        assert_eq!(order.stop_loss, dec!(4101.5));
    }
    let tp1 = h.gateway.order(h.leg_ticket(&group_id, LegIndex::TP1)).unwrap();
    assert_eq!(tp1.stop_loss, dec!(4080.0));

    let calls = h.gateway.modify_calls().len();
    let outcome = h.trail.execute(&mut h.registry).await.unwrap();
    assert!(outcome.promoted.is_empty());
    assert_eq!(h.gateway.modify_calls().len(), calls);
}

#[tokio::test]
async fn failed_tp2_placement_reads_as_closed() {
    let mut h = Harness::new();
    h.gateway.reject_next_opens([1]);
    let group_id = h.place_group(sell_limit(dec!(4100.0))).await;

    let outcome = h.trail.execute(&mut h.registry).await.unwrap();

    assert_eq!(outcome.promoted, vec![group_id.clone()]);
    for leg in LegIndex::TRAILED {
        let order = h.gateway.order(h.leg_ticket(&group_id, leg)).unwrap();
        assert_eq!(order.stop_loss, dec!(4098.5));
    }
}

#[tokio::test]
async fn rejected_stop_moves_still_flip_tp2() {
    let mut h = Harness::new();
    let group_id = h.place_group(buy_stop(dec!(4100.0))).await;
    h.fill_all(&group_id);
    h.gateway
        .hit_take_profit(h.leg_ticket(&group_id, LegIndex::TP2))
        .unwrap();
    h.gateway.fail_modifies(true);

    let outcome = h.trail.execute(&mut h.registry).await.unwrap();

    assert_eq!(outcome.modify_failures, 3);
    assert_eq!(outcome.stops_moved, 0);
    assert!(h.registry.get(&group_id).unwrap().tp2_reached());

    // fire-and-forget: no retry on the next scan
    let attempted = h.gateway.modify_calls().len();
    h.gateway.fail_modifies(false);
    h.trail.execute(&mut h.registry).await.unwrap();
    assert_eq!(h.gateway.modify_calls().len(), attempted);
}

#[tokio::test]
async fn tighter_existing_stop_is_never_loosened() {
    let mut h = Harness::new();
    let mut request = buy_stop(dec!(4100.0));
    request.sl = dec!(4102.0);
    let group_id = h.place_group(request).await;
    h.fill_all(&group_id);
    h.gateway
        .hit_take_profit(h.leg_ticket(&group_id, LegIndex::TP2))
        .unwrap();

    let outcome = h.trail.execute(&mut h.registry).await.unwrap();

    assert_eq!(outcome.stops_moved, 0);
    assert!(h.gateway.modify_calls().is_empty());
    assert!(h.registry.get(&group_id).unwrap().tp2_reached());
}

#[tokio::test]
async fn group_is_removed_once_every_leg_is_gone() {
    let mut h = Harness::new();
    let group_id = h.place_group(buy_stop(dec!(4100.0))).await;

    for ticket in h.tickets(&group_id).into_iter().flatten() {
        h.gateway.cancel_order(ticket).await.unwrap();
    }
    let outcome = h.trail.execute(&mut h.registry).await.unwrap();

    assert_eq!(outcome.removed, vec![group_id]);
    assert!(h.registry.is_empty());
}

// ============================================
// Safe-Shutdown Consolidator
// ============================================

#[tokio::test]
async fn safe_shutdown_collapses_take_profits_to_tp2() {
    let mut h = Harness::new();
    let group_id = h.place_group(buy_stop(dec!(4100.0))).await;
    h.gateway
        .fill_pending(h.leg_ticket(&group_id, LegIndex::TP3))
        .unwrap();

    let report = h.shutdown.execute(&mut h.registry).await.unwrap();

    assert_eq!(report.groups_modified, 1);
    assert_eq!(report.pending_modified, 3);
    assert_eq!(report.positions_modified, 1);
    assert_eq!(report.groups[0].take_profit, dec!(4104.5));

    let tp1 = h.gateway.order(h.leg_ticket(&group_id, LegIndex::TP1)).unwrap();
    assert_eq!(tp1.take_profit, dec!(4101.5));
    for leg in LegIndex::CONSOLIDATED {
        let order = h.gateway.order(h.leg_ticket(&group_id, leg)).unwrap();
        assert_eq!(order.take_profit, dec!(4104.5));
        assert_eq!(order.stop_loss, dec!(4080.0));
        assert_eq!(order.price, dec!(4100.0));
    }

    let position_calls = h
        .gateway
        .modify_calls()
        .into_iter()
        .filter(|call| call.target == ModifyTarget::Position)
        .count();
    assert_eq!(position_calls, 1);
    assert!(!h.registry.get(&group_id).unwrap().tp2_reached());
}

#[tokio::test]
async fn safe_shutdown_twice_is_idempotent_and_still_counted() {
    let mut h = Harness::new();
    let group_id = h.place_group(buy_stop(dec!(4100.0))).await;

    let first = h.shutdown.execute(&mut h.registry).await.unwrap();
    let after_first: Vec<Decimal> = h
        .tickets(&group_id)
        .into_iter()
        .flatten()
        .map(|t| h.gateway.order(t).unwrap().take_profit)
        .collect();

    let second = h.shutdown.execute(&mut h.registry).await.unwrap();
    let after_second: Vec<Decimal> = h
        .tickets(&group_id)
        .into_iter()
        .flatten()
        .map(|t| h.gateway.order(t).unwrap().take_profit)
        .collect();

    assert_eq!(after_first, after_second);
    assert_eq!(first.pending_modified, 4);
    assert_eq!(second.pending_modified, 4);
    assert_eq!(first.groups_modified, second.groups_modified);
}

#[tokio::test]
async fn scenario_d_safe_shutdown_skips_groups_past_tp2() {
    let mut h = Harness::new();
    let group_id = h.place_group(buy_stop(dec!(4100.0))).await;
    h.fill_all(&group_id);
    h.gateway
        .hit_take_profit(h.leg_ticket(&group_id, LegIndex::TP2))
        .unwrap();
    h.trail.execute(&mut h.registry).await.unwrap();
    let calls = h.gateway.modify_calls().len();

    let report = h.shutdown.execute(&mut h.registry).await.unwrap();

    assert_eq!(report.groups_modified, 0);
    assert!(report.groups.is_empty());
    assert_eq!(h.gateway.modify_calls().len(), calls);
}

#[tokio::test]
async fn safe_shutdown_with_every_modify_rejected_reports_nothing() {
    let mut h = Harness::new();
    h.place_group(buy_stop(dec!(4100.0))).await;
    h.gateway.fail_modifies(true);

    let report = h.shutdown.execute(&mut h.registry).await.unwrap();

    assert_eq!(report.groups_modified, 0);
    assert!(report.groups.is_empty());
}

// ============================================
// Recovery Builder
// ============================================

#[tokio::test]
async fn recovery_round_trip_matches_live_registry() {
    let mut h = Harness::new();
    let trailed = h.place_group(buy_stop(dec!(4100.0))).await;
    let untouched = h.place_group(sell_limit(dec!(4120.0))).await;
    h.fill_all(&trailed);
    h.gateway
        .fill_pending(h.leg_ticket(&untouched, LegIndex::TP1))
        .unwrap();
    h.gateway
        .hit_take_profit(h.leg_ticket(&trailed, LegIndex::TP2))
        .unwrap();
    h.trail.execute(&mut h.registry).await.unwrap();

    let mut rebuilt = GroupRegistry::new();
    let report = h.recover().execute(&mut rebuilt).await.unwrap();

    assert_eq!(report.groups, 2);
    assert_eq!(report.legs, 9);
    assert_eq!(report.tp2_inferred, 1);
    assert_eq!(rebuilt.len(), h.registry.len());
    for live in h.registry.iter() {
        let recovered = rebuilt.get(live.id()).unwrap();
        for leg in LegIndex::ALL {
            assert_eq!(recovered.ticket(leg), live.ticket(leg), "{} {leg}", live.id());
        }
        assert_eq!(recovered.tp2_reached(), live.tp2_reached());
        assert_eq!(recovered.entry_price(), live.entry_price());
        assert_eq!(recovered.direction(), live.direction());
    }
}

#[tokio::test]
async fn recovered_registry_trails_like_live_one() {
    let mut h = Harness::new();
    let group_id = h.place_group(buy_stop(dec!(4100.0))).await;
    h.fill_all(&group_id);

    let mut rebuilt = GroupRegistry::new();
    h.recover().execute(&mut rebuilt).await.unwrap();
    h.gateway
        .hit_take_profit(h.leg_ticket(&group_id, LegIndex::TP2))
        .unwrap();

    let outcome = h.trail.execute(&mut rebuilt).await.unwrap();

    assert_eq!(outcome.promoted, vec![group_id]);
    assert_eq!(outcome.stops_moved, 3);
}

#[tokio::test]
async fn recovery_skips_foreign_and_untagged_orders() {
    let h = Harness::new();
    let foreign_group = GroupId::new("XAUUSD_4000.00_20250101000000");
    let order = |ticket: u64, magic: u64, comment: String| VenueOrder {
        ticket: Ticket::from_raw(ticket).unwrap(),
        symbol: Symbol::new("XAUUSD"),
        kind: VenueOrderKind::BuyLimit,
        volume: dec!(0.01),
        price: dec!(4000),
        stop_loss: dec!(3990),
        take_profit: dec!(4001.5),
        profit: Decimal::ZERO,
        comment,
        magic,
        tag: None,
        opened_at: Utc::now(),
    };
    h.gateway.insert_order(order(
        100,
        7,
        LegTag::new(foreign_group.clone(), LegIndex::TP1).to_comment("other"),
    ));
    h.gateway.insert_order(order(101, MAGIC, "manual trade".to_string()));
    h.gateway.insert_order(order(102, MAGIC, "split|GROUP:x|TP:9".to_string()));

    let mut rebuilt = GroupRegistry::new();
    let report = h.recover().execute(&mut rebuilt).await.unwrap();

    assert_eq!(report.groups, 0);
    assert_eq!(report.skipped, 2);
    assert!(rebuilt.is_empty());
}

#[tokio::test]
async fn recovery_prefers_structured_tags_over_comments() {
    let mut h = Harness::with_gateway(PaperGateway::new(symbols()).with_structured_tags());
    let group_id = h.place_group(buy_stop(dec!(4100.0))).await;

    // an operator edits the comment of the TP3 leg
    let ticket = h.leg_ticket(&group_id, LegIndex::TP3);
    let mut edited = h.gateway.order(ticket).unwrap();
    edited.comment = "edited by hand".to_string();
    h.gateway.insert_order(edited);

    let mut rebuilt = GroupRegistry::new();
    h.recover().execute(&mut rebuilt).await.unwrap();

    let recovered = rebuilt.get(&group_id).unwrap();
    assert_eq!(recovered.placed_count(), 5);
    assert_eq!(recovered.ticket(LegIndex::TP3), Some(ticket));
}
