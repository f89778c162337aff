//! Split order group aggregate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{GroupId, Symbol, Ticket};

use super::direction::{Direction, OrderKind};
use super::ladder::{LEG_SHARES_PCT, breakeven_price, take_profit_price};
use super::leg::{LEG_COUNT, Leg, LegIndex};

/// Parameters for creating a group.
#[derive(Debug, Clone)]
pub struct NewGroup {
    /// Group identifier.
    pub id: GroupId,
    /// Symbol traded by every leg.
    pub symbol: Symbol,
    /// Effective order kind after market resolution.
    pub order_kind: OrderKind,
    /// Shared entry price.
    pub entry_price: Decimal,
    /// Per-symbol pip value used for the ladder.
    pub pip_value: Decimal,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// One logical trade request after fan-out into five legs.
///
/// # Invariants
///
/// - There are always exactly five leg slots; an empty ticket means the leg
///   was never placed (or was not observed at recovery), not that it was removed.
/// - `tp2_reached` is monotonic: once true it never reverts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOrderGroup {
    id: GroupId,
    symbol: Symbol,
    direction: Direction,
    order_kind: OrderKind,
    entry_price: Decimal,
    pip_value: Decimal,
    legs: [Leg; LEG_COUNT],
    tp2_reached: bool,
    created_at: DateTime<Utc>,
}

impl SplitOrderGroup {
    /// Create a group with five empty leg slots on the take-profit ladder.
    #[must_use]
    pub fn new(params: NewGroup) -> Self {
        let direction = params.order_kind.direction();
        let legs = LegIndex::ALL.map(|index| {
            Leg::empty(
                index,
                take_profit_price(params.entry_price, direction, index, params.pip_value),
                LEG_SHARES_PCT[index.slot()],
            )
        });

        Self {
            id: params.id,
            symbol: params.symbol,
            direction,
            order_kind: params.order_kind,
            entry_price: params.entry_price,
            pip_value: params.pip_value,
            legs,
            tp2_reached: false,
            created_at: params.created_at,
        }
    }

    /// Record a venue order in a slot.
    pub fn attach_leg(
        &mut self,
        index: LegIndex,
        ticket: Ticket,
        volume: Decimal,
        take_profit: Decimal,
    ) {
        let leg = &mut self.legs[index.slot()];
        leg.ticket = Some(ticket);
        leg.volume = volume;
        leg.take_profit = take_profit;
    }

    /// Forget the venue order of a slot that is no longer live.
    ///
    /// Returns true if a ticket was held.
    pub fn release_leg(&mut self, index: LegIndex) -> bool {
        self.legs[index.slot()].ticket.take().is_some()
    }

    /// Set the planned volume of a slot without a venue order.
    pub fn plan_volume(&mut self, index: LegIndex, volume: Decimal) {
        self.legs[index.slot()].volume = volume;
    }

    /// Record a new take-profit for a slot.
    pub fn set_take_profit(&mut self, index: LegIndex, take_profit: Decimal) {
        self.legs[index.slot()].take_profit = take_profit;
    }

    /// Latch the TP2 flag.
    ///
    /// Returns true only on the false → true transition.
    pub fn mark_tp2_reached(&mut self) -> bool {
        let transitioned = !self.tp2_reached;
        self.tp2_reached = true;
        transitioned
    }

    /// Group identifier.
    #[must_use]
    pub const fn id(&self) -> &GroupId {
        &self.id
    }

    /// Traded symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Trade direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Effective order kind.
    #[must_use]
    pub const fn order_kind(&self) -> OrderKind {
        self.order_kind
    }

    /// Shared entry price.
    #[must_use]
    pub const fn entry_price(&self) -> Decimal {
        self.entry_price
    }

    /// Pip value of the symbol.
    #[must_use]
    pub const fn pip_value(&self) -> Decimal {
        self.pip_value
    }

    /// Whether the TP2 leg has been observed closed.
    #[must_use]
    pub const fn tp2_reached(&self) -> bool {
        self.tp2_reached
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// All five slots in order.
    #[must_use]
    pub const fn legs(&self) -> &[Leg; LEG_COUNT] {
        &self.legs
    }

    /// One slot.
    #[must_use]
    pub const fn leg(&self, index: LegIndex) -> &Leg {
        &self.legs[index.slot()]
    }

    /// Ticket of a slot, if any.
    #[must_use]
    pub const fn ticket(&self, index: LegIndex) -> Option<Ticket> {
        self.legs[index.slot()].ticket
    }

    /// First placed ticket in slot order.
    #[must_use]
    pub fn first_ticket(&self) -> Option<Ticket> {
        self.legs.iter().find_map(|leg| leg.ticket)
    }

    /// Number of slots holding a ticket.
    #[must_use]
    pub fn placed_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_placed()).count()
    }

    /// Ladder take-profit of a slot.
    #[must_use]
    pub fn ladder_take_profit(&self, index: LegIndex) -> Decimal {
        take_profit_price(self.entry_price, self.direction, index, self.pip_value)
    }

    /// Breakeven stop-loss for the trailed legs.
    #[must_use]
    pub fn breakeven_price(&self) -> Decimal {
        breakeven_price(self.entry_price, self.direction, self.pip_value)
    }
}
