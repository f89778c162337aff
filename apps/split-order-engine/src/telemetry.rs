//! Tracing Setup
//!
//! Installs the global `tracing` subscriber for the binary.
//!
//! # Configuration
//!
//! - `RUST_LOG`: filter directives; overrides `observability.log_level`
//! - `observability.log_format`: `pretty` for terminals, `json` for log shipping
//!
//! # Usage
//!
//! ```rust,ignore
//! use split_order_engine::telemetry::init_tracing;
//!
//! let config = load_config(None)?;
//! init_tracing(&config.observability);
//! ```

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ObservabilityConfig};

/// Build the filter: `RUST_LOG` when set, otherwise the configured level.
#[must_use]
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Initialize the tracing subscriber.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = env_filter(config);

    match config.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_current_span(true)
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }

    tracing::debug!(format = ?config.log_format, "Tracing initialized");
}
