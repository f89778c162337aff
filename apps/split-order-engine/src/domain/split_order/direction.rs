//! Trade direction and pending order kinds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a split order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Profits when price rises.
    Long,
    /// Profits when price falls.
    Short,
}

impl Direction {
    /// Returns the sign for price offsets.
    ///
    /// Long = +1, Short = -1
    #[must_use]
    pub const fn sign(&self) -> Decimal {
        match self {
            Self::Long => Decimal::ONE,
            Self::Short => Decimal::NEGATIVE_ONE,
        }
    }

    /// Whether `candidate` is strictly further in the profit direction than `current`.
    #[must_use]
    pub fn is_improvement(&self, candidate: Decimal, current: Decimal) -> bool {
        match self {
            Self::Long => candidate > current,
            Self::Short => candidate < current,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// Pending order kind used for every leg of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    /// Buy below the market.
    BuyLimit,
    /// Sell above the market.
    SellLimit,
    /// Buy once the market rises to the trigger.
    BuyStop,
    /// Sell once the market falls to the trigger.
    SellStop,
}

impl OrderKind {
    /// Direction of the position this order opens.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        match self {
            Self::BuyLimit | Self::BuyStop => Direction::Long,
            Self::SellLimit | Self::SellStop => Direction::Short,
        }
    }

    /// Returns true for the stop variants.
    #[must_use]
    pub const fn is_stop(&self) -> bool {
        matches!(self, Self::BuyStop | Self::SellStop)
    }

    /// The limit variant for a direction.
    #[must_use]
    pub const fn limit_for(direction: Direction) -> Self {
        match direction {
            Direction::Long => Self::BuyLimit,
            Direction::Short => Self::SellLimit,
        }
    }

    /// Resolve the kind that can actually rest at the venue.
    ///
    /// A stop whose trigger the market has already passed is downgraded to the
    /// limit of the same direction: a buy stop below the ask becomes a buy
    /// limit, a sell stop above the bid becomes a sell limit. Limits are
    /// returned unchanged.
    #[must_use]
    pub fn resolve(self, price: Decimal, bid: Decimal, ask: Decimal) -> Self {
        match self {
            Self::BuyStop if price < ask => Self::BuyLimit,
            Self::SellStop if price > bid => Self::SellLimit,
            other => other,
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuyLimit => write!(f, "BUY_LIMIT"),
            Self::SellLimit => write!(f, "SELL_LIMIT"),
            Self::BuyStop => write!(f, "BUY_STOP"),
            Self::SellStop => write!(f, "SELL_STOP"),
        }
    }
}
