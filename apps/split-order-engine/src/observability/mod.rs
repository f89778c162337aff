//! Observability module for metrics.
//!
//! Structured logging lives in [`crate::telemetry`].

mod metrics;

pub use self::metrics::{
    MetricsConfig, MetricsError, init_metrics, record_breakeven_promotion, record_command,
    record_group_created, record_leg_placement, record_modify_failure, set_groups_tracked,
};
