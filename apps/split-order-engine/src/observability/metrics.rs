//! Prometheus metrics for the split order engine.
//!
//! The recording functions are no-ops until [`init_metrics`] installs the
//! exporter, so use cases call them unconditionally.
//!
//! # Example
//!
//! ```ignore
//! use split_order_engine::observability::{init_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::with_port(9090))?;
//! record_group_created();
//! ```

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Where the Prometheus scrape endpoint listens.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Bind address of the `/metrics` listener.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsConfig {
    /// Listen on all interfaces at `port`.
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
        }
    }
}

/// Install the global recorder and start the scrape listener.
///
/// # Errors
///
/// Fails when a recorder is already installed or the port is taken.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(addr = %config.listen_addr, "Metrics endpoint listening");
    Ok(())
}

/// Exporter setup failure.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The recorder or listener could not be installed.
    #[error("cannot install Prometheus exporter: {0}")]
    Installation(String),
}

// ============================================================================
// Split Order Metrics
// ============================================================================

/// Record one leg placement attempt.
///
/// * `result` - "placed", "rejected" or "skipped"
pub fn record_leg_placement(result: &'static str) {
    counter!("split_legs_placed_total", "result" => result).increment(1);
}

/// Record a newly registered group.
pub fn record_group_created() {
    counter!("split_groups_created_total").increment(1);
}

/// Record a TP2 → breakeven promotion.
pub fn record_breakeven_promotion() {
    counter!("split_breakeven_promotions_total").increment(1);
}

/// Record a rejected modify.
///
/// * `operation` - "trail" or "safe_shutdown"
pub fn record_modify_failure(operation: &'static str) {
    counter!("split_modify_failures_total", "operation" => operation).increment(1);
}

/// Update the tracked group gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_groups_tracked(count: usize) {
    gauge!("split_groups_tracked").set(count as f64);
}

// ============================================================================
// Command Metrics
// ============================================================================

/// Record a handled command.
///
/// * `action` - Wire action name
/// * `result` - "success" or "failure"
pub fn record_command(action: &str, result: &'static str) {
    counter!(
        "split_commands_total",
        "action" => action.to_string(),
        "result" => result
    )
    .increment(1);
}
