//! Group identifier generation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::shared::{GroupId, Symbol};

/// Issues `<SYMBOL>_<price>_<YYYYMMDDhhmmss>` identifiers.
///
/// Repeated stamps within one second get a `-<n>` suffix so ids never collide
/// inside one process.
#[derive(Debug, Default)]
pub struct GroupIdGenerator {
    second: String,
    issued: HashMap<String, u32>,
}

impl GroupIdGenerator {
    /// Create a generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next identifier.
    pub fn next_id(
        &mut self,
        symbol: &Symbol,
        entry_price: Decimal,
        digits: u32,
        now: DateTime<Utc>,
    ) -> GroupId {
        let second = now.format("%Y%m%d%H%M%S").to_string();
        if second != self.second {
            self.issued.clear();
            self.second.clone_from(&second);
        }

        let stamp = format!("{}_{:.*}_{}", symbol, digits as usize, entry_price, second);
        let count = self.issued.entry(stamp.clone()).or_insert(0);
        let id = if *count == 0 {
            GroupId::new(stamp)
        } else {
            GroupId::new(format!("{stamp}-{count}"))
        };
        *count += 1;
        id
    }
}
