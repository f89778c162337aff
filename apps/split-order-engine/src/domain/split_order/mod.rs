//! Split Order Bounded Context
//!
//! One requested trade becomes a group of five linked legs with staggered
//! take-profit targets.
//!
//! # Key Concepts
//!
//! - **Group**: five leg slots sharing one entry, joined by [`GroupId`]
//! - **Ladder**: leg volumes (60/10/10/10/10) and take-profit offsets
//!   (15 + 30 × slot pips)
//! - **Leg tag**: the `|GROUP:<id>|TP:<n>` comment suffix, the only state the
//!   venue keeps for us across restarts
//! - **Registry**: the volatile table of tracked groups
//!
//! [`GroupId`]: crate::domain::shared::GroupId

mod comment;
mod direction;
mod group;
mod group_id;
mod ladder;
mod leg;
mod registry;
mod symbol_spec;

pub use comment::LegTag;
pub use direction::{Direction, OrderKind};
pub use group::{NewGroup, SplitOrderGroup};
pub use group_id::GroupIdGenerator;
pub use ladder::{
    LEG_SHARES_PCT, TP_BASE_PIPS, TP_STEP_PIPS, breakeven_price, leg_volumes, round_to_step,
    take_profit_price,
};
pub use leg::{LEG_COUNT, Leg, LegIndex};
pub use registry::GroupRegistry;
pub use symbol_spec::{SymbolSpec, SymbolTable};
