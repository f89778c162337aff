//! Volume split and take-profit ladder.
//!
//! Leg `i` (zero-based) targets `entry ± (15 + 30 × i) × pip`. TP1 doubles as
//! the breakeven level once TP2 has closed.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::direction::Direction;
use super::leg::{LEG_COUNT, LegIndex};

/// Pips of profit targeted by TP1.
pub const TP_BASE_PIPS: Decimal = dec!(15);

/// Additional pips between consecutive take-profit legs.
pub const TP_STEP_PIPS: Decimal = dec!(30);

/// Nominal share of the total volume per leg, in percent.
pub const LEG_SHARES_PCT: [Decimal; LEG_COUNT] = [dec!(60), dec!(10), dec!(10), dec!(10), dec!(10)];

/// Take-profit price of a leg.
#[must_use]
pub fn take_profit_price(
    entry: Decimal,
    direction: Direction,
    leg: LegIndex,
    pip_value: Decimal,
) -> Decimal {
    let pips = TP_BASE_PIPS + TP_STEP_PIPS * Decimal::from(leg.slot());
    entry + direction.sign() * pips * pip_value
}

/// Stop-loss level the surviving legs move to once TP2 has closed.
#[must_use]
pub fn breakeven_price(entry: Decimal, direction: Direction, pip_value: Decimal) -> Decimal {
    take_profit_price(entry, direction, LegIndex::TP1, pip_value)
}

/// Round a volume to the nearest multiple of the venue lot step.
///
/// Residual drift against the requested total is accepted, never corrected.
#[must_use]
pub fn round_to_step(volume: Decimal, lot_step: Decimal) -> Decimal {
    if lot_step <= Decimal::ZERO {
        return volume;
    }
    let steps =
        (volume / lot_step).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    (steps * lot_step).normalize()
}

/// Split a total volume into the five leg volumes.
#[must_use]
pub fn leg_volumes(total: Decimal, lot_step: Decimal) -> [Decimal; LEG_COUNT] {
    LEG_SHARES_PCT.map(|share| round_to_step(total * share / dec!(100), lot_step))
}
