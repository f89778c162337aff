//! Domain errors for the split order engine.

use thiserror::Error;

/// Rejections raised while building domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The symbol is blank after trimming.
    #[error("symbol is empty")]
    EmptySymbol,

    /// The symbol carries a character that would break a group id or comment.
    #[error("symbol '{symbol}' may only contain letters, digits, '.' and '#'")]
    MalformedSymbol {
        /// Offending symbol.
        symbol: String,
    },

    /// A numeric constant is out of range.
    #[error("{field} {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

impl DomainError {
    /// Shorthand for [`DomainError::InvalidValue`].
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
