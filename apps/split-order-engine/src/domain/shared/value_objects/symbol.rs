//! Venue symbol.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// A venue trading symbol (e.g. "XAUUSD", "EURUSD", "US30.cash").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Trimmed and upper-cased.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Raw symbol text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate the symbol before it is used to build a group.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is empty or contains characters that would
    /// corrupt a group identifier.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            return Err(DomainError::EmptySymbol);
        }
        if !self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '#')
        {
            return Err(DomainError::MalformedSymbol {
                symbol: self.0.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_is_normalized() {
        assert_eq!(Symbol::new(" xauusd ").as_str(), "XAUUSD");
    }

    #[test]
    fn deserialized_symbol_is_normalized() {
        let symbol: Symbol = serde_json::from_str(r#"" eurusd""#).unwrap();
        assert_eq!(symbol, Symbol::new("EURUSD"));
        assert_eq!(serde_json::to_string(&symbol).unwrap(), r#""EURUSD""#);
    }

    #[test]
    fn symbol_validate_accepts_broker_suffixes() {
        assert!(Symbol::new("US30.cash").validate().is_ok());
        assert!(Symbol::new("GER40#").validate().is_ok());
    }

    #[test]
    fn symbol_validate_rejects_empty_and_separators() {
        assert_eq!(Symbol::new("  ").validate(), Err(DomainError::EmptySymbol));
        assert!(matches!(
            Symbol::new("XAU|USD").validate(),
            Err(DomainError::MalformedSymbol { .. })
        ));
        assert!(Symbol::new("XAU_USD").validate().is_err());
    }
}
