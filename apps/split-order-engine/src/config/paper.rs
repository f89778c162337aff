//! Paper venue seed data.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Seed configuration for the in-memory venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    /// Starting account balance.
    #[serde(default = "default_account_balance")]
    pub account_balance: Decimal,
    /// Initial quotes by symbol.
    #[serde(default)]
    pub quotes: BTreeMap<String, PaperQuote>,
}

/// One seeded bid/ask pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaperQuote {
    /// Bid price.
    pub bid: Decimal,
    /// Ask price.
    pub ask: Decimal,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            account_balance: default_account_balance(),
            quotes: BTreeMap::new(),
        }
    }
}

pub(crate) const fn default_account_balance() -> Decimal {
    dec!(10000)
}
