//! Per-symbol trading parameters.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{DomainError, Symbol};

/// Venue constants for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSpec {
    /// Price increment of one pip.
    pub pip_value: Decimal,
    /// Volume increment accepted by the venue.
    pub lot_step: Decimal,
    /// Smallest tradable volume.
    pub min_volume: Decimal,
    /// Largest tradable volume.
    pub max_volume: Decimal,
    /// Price precision.
    #[serde(default = "default_digits")]
    pub digits: u32,
}

const fn default_digits() -> u32 {
    2
}

impl SymbolSpec {
    /// Check the constants are usable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` for non-positive steps or an empty
    /// volume range.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("pip_value", self.pip_value),
            ("lot_step", self.lot_step),
            ("min_volume", self.min_volume),
        ] {
            if value <= Decimal::ZERO {
                return Err(DomainError::invalid(
                    field,
                    format!("must be positive, got {value}"),
                ));
            }
        }
        if self.min_volume > self.max_volume {
            return Err(DomainError::invalid(
                "max_volume",
                format!(
                    "must not be below min_volume ({} > {})",
                    self.min_volume, self.max_volume
                ),
            ));
        }
        Ok(())
    }

    /// Whether a volume is inside the tradable range.
    #[must_use]
    pub fn accepts_volume(&self, volume: Decimal) -> bool {
        volume >= self.min_volume && volume <= self.max_volume
    }
}

/// Lookup of [`SymbolSpec`] by symbol.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    specs: HashMap<Symbol, SymbolSpec>,
}

impl SymbolTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a symbol.
    #[must_use]
    pub fn with(mut self, symbol: impl Into<Symbol>, spec: SymbolSpec) -> Self {
        self.specs.insert(symbol.into(), spec);
        self
    }

    /// Look up a symbol.
    #[must_use]
    pub fn get(&self, symbol: &Symbol) -> Option<&SymbolSpec> {
        self.specs.get(symbol)
    }

    /// Number of configured symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no symbol is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl FromIterator<(Symbol, SymbolSpec)> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = (Symbol, SymbolSpec)>>(iter: I) -> Self {
        Self {
            specs: iter.into_iter().collect(),
        }
    }
}
