//! Split order request and result DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::{VenueOrder, VenueOrderKind};
use crate::domain::shared::{GroupId, Symbol, Ticket};
use crate::domain::split_order::{LegIndex, OrderKind};

/// `PLACE_ORDER` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderDto {
    /// Requested order kind.
    pub order_type: OrderKind,
    /// Symbol.
    pub symbol: Symbol,
    /// Entry price.
    pub price: Decimal,
    /// Stop-loss shared by all legs.
    pub sl: Decimal,
    /// Requested take-profit per leg.
    pub tp_levels: Vec<Decimal>,
    /// Total volume; the configured default when absent.
    #[serde(default)]
    pub lot_size: Option<Decimal>,
    /// Slippage in points; the configured default when absent.
    #[serde(default)]
    pub deviation: Option<u32>,
    /// Comment prefix; the configured prefix when absent.
    #[serde(default)]
    pub comment: Option<String>,
    /// Identifying marker; when sent it must equal the configured one, since
    /// recovery only reads orders carrying that marker.
    #[serde(default)]
    pub magic_number: Option<u64>,
}

/// Result of one leg placement attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegPlacement {
    /// Slot.
    pub index: LegIndex,
    /// Ticket, `None` if the leg failed.
    pub ticket: Option<Ticket>,
    /// Volume requested for the leg.
    pub volume: Decimal,
    /// Take-profit of the leg.
    pub take_profit: Decimal,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LegPlacement {
    /// Whether the venue accepted this leg.
    #[must_use]
    pub const fn is_placed(&self) -> bool {
        self.ticket.is_some()
    }
}

/// Result of a split placement with at least one leg placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementOutcome {
    /// First placed ticket in slot order.
    pub ticket: Ticket,
    /// Group identifier.
    pub group_id: GroupId,
    /// Effective kind after market resolution.
    pub order_kind: OrderKind,
    /// Per-leg results.
    pub legs: Vec<LegPlacement>,
}

impl PlacementOutcome {
    /// Number of legs placed.
    #[must_use]
    pub fn placed_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_placed()).count()
    }

    /// Whether some legs failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.placed_count() < self.legs.len()
    }
}

/// Per-group line of the safe-shutdown report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupShutdownEntry {
    /// Group identifier.
    pub group_id: GroupId,
    /// Take-profit applied to legs TP2..TP5.
    pub take_profit: Decimal,
    /// Pending-order legs modified.
    pub pending_modified: usize,
    /// Position legs modified.
    pub positions_modified: usize,
    /// Modify calls the venue rejected.
    pub failures: usize,
}

/// Aggregate result of a safe shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SafeShutdownReport {
    /// Groups with at least one modified leg.
    pub groups_modified: usize,
    /// Pending-order legs modified.
    pub pending_modified: usize,
    /// Position legs modified.
    pub positions_modified: usize,
    /// Per-group breakdown.
    pub groups: Vec<GroupShutdownEntry>,
}

/// One venue position or pending order with its parsed group metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueOrderDto {
    /// Ticket.
    pub ticket: Ticket,
    /// Symbol.
    pub symbol: Symbol,
    /// Kind.
    #[serde(rename = "type")]
    pub kind: VenueOrderKind,
    /// Volume.
    pub volume: Decimal,
    /// Entry or open price.
    pub price: Decimal,
    /// Stop-loss.
    pub sl: Decimal,
    /// Take-profit.
    pub tp: Decimal,
    /// Floating profit.
    pub profit: Decimal,
    /// Comment.
    pub comment: String,
    /// Identifying marker.
    pub magic: u64,
    /// Group, when the order carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    /// Take-profit number (1..5), when the order carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tp_index: Option<u8>,
    /// Placement time.
    pub opened_at: DateTime<Utc>,
}

impl From<VenueOrder> for VenueOrderDto {
    fn from(order: VenueOrder) -> Self {
        let tag = order.leg_tag();
        Self {
            ticket: order.ticket,
            symbol: order.symbol,
            kind: order.kind,
            volume: order.volume,
            price: order.price,
            sl: order.stop_loss,
            tp: order.take_profit,
            profit: order.profit,
            comment: order.comment,
            magic: order.magic,
            group_id: tag.as_ref().map(|t| t.group_id.clone()),
            tp_index: tag.map(|t| t.leg.tp_number()),
            opened_at: order.opened_at,
        }
    }
}

/// `GET_STATS` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsDto {
    /// Account balance.
    pub balance: Decimal,
    /// Account equity.
    pub equity: Decimal,
    /// Used margin.
    pub margin: Decimal,
    /// Free margin.
    pub free_margin: Decimal,
    /// Floating profit.
    pub profit: Decimal,
    /// Groups in the registry.
    pub tracked_groups: usize,
    /// Tracked groups whose TP2 leg has closed.
    pub groups_past_tp2: usize,
    /// Tracked legs still live at the venue.
    pub live_legs: usize,
    /// Venue positions.
    pub positions_count: usize,
    /// Venue pending orders.
    pub orders_count: usize,
}
