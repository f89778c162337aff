//! Leg slots of a split order group.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::Ticket;

/// Number of legs in every group.
pub const LEG_COUNT: usize = 5;

/// Position of a leg inside its group.
///
/// Slot 0 is TP1 and slot 4 is TP5; the meaning of a slot never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LegIndex(u8);

impl LegIndex {
    /// First take-profit leg, also the breakeven level.
    pub const TP1: Self = Self(0);
    /// Second take-profit leg; its closure triggers breakeven trailing.
    pub const TP2: Self = Self(1);
    /// Third take-profit leg.
    pub const TP3: Self = Self(2);
    /// Fourth take-profit leg.
    pub const TP4: Self = Self(3);
    /// Fifth take-profit leg.
    pub const TP5: Self = Self(4);

    /// All slots in order.
    pub const ALL: [Self; LEG_COUNT] = [Self::TP1, Self::TP2, Self::TP3, Self::TP4, Self::TP5];

    /// Legs that are promoted to breakeven once TP2 closes.
    pub const TRAILED: [Self; 3] = [Self::TP3, Self::TP4, Self::TP5];

    /// Legs whose take-profit is collapsed by a safe shutdown.
    pub const CONSOLIDATED: [Self; 4] = [Self::TP2, Self::TP3, Self::TP4, Self::TP5];

    /// Create from a zero-based slot.
    #[must_use]
    pub const fn from_slot(slot: usize) -> Option<Self> {
        if slot < LEG_COUNT {
            Some(Self(slot as u8))
        } else {
            None
        }
    }

    /// Create from the one-based take-profit number used in comments.
    #[must_use]
    pub const fn from_tp_number(number: u8) -> Option<Self> {
        if number >= 1 && number as usize <= LEG_COUNT {
            Some(Self(number - 1))
        } else {
            None
        }
    }

    /// Zero-based slot.
    #[must_use]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }

    /// One-based take-profit number (1..=5).
    #[must_use]
    pub const fn tp_number(self) -> u8 {
        self.0 + 1
    }
}

impl TryFrom<u8> for LegIndex {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_slot(value as usize).ok_or_else(|| format!("leg slot out of range: {value}"))
    }
}

impl From<LegIndex> for u8 {
    fn from(value: LegIndex) -> Self {
        value.0
    }
}

impl fmt::Display for LegIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TP{}", self.tp_number())
    }
}

/// One of the five venue orders/positions of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    /// Fixed slot.
    pub index: LegIndex,
    /// Venue ticket, `None` when placement failed or the leg was never seen.
    pub ticket: Option<Ticket>,
    /// Leg volume in lots.
    pub volume: Decimal,
    /// Take-profit price.
    pub take_profit: Decimal,
    /// Share of the requested total volume, in percent.
    pub nominal_share: Decimal,
}

impl Leg {
    /// An empty slot with no venue order behind it.
    #[must_use]
    pub const fn empty(index: LegIndex, take_profit: Decimal, nominal_share: Decimal) -> Self {
        Self {
            index,
            ticket: None,
            volume: Decimal::ZERO,
            take_profit,
            nominal_share,
        }
    }

    /// Whether a venue order was ever recorded for this slot.
    #[must_use]
    pub const fn is_placed(&self) -> bool {
        self.ticket.is_some()
    }
}
