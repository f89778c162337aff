//! Engine loop and placement defaults.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::application::services::EngineSettings;
use crate::application::use_cases::PlacementSettings;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Identifying marker stamped on every leg and matched at recovery.
    #[serde(default = "default_magic_number")]
    pub magic_number: u64,
    /// Comment prefix for requests without their own comment.
    #[serde(default = "default_comment_prefix")]
    pub comment_prefix: String,
    /// Interval between command channel polls.
    #[serde(default = "default_command_poll_interval_ms")]
    pub command_poll_interval_ms: u64,
    /// Bounded wait inside one poll.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// Fallback scan interval when no market update arrives.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,
    /// Price deviation for requests without their own.
    #[serde(default = "default_deviation")]
    pub default_deviation: u32,
    /// Total volume for requests without their own.
    #[serde(default = "default_lot_size")]
    pub default_lot_size: Decimal,
}

impl EngineConfig {
    /// Loop timings for [`crate::SplitOrderEngine`].
    #[must_use]
    pub const fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            scan_interval: Duration::from_millis(self.scan_interval_ms),
            command_poll_interval: Duration::from_millis(self.command_poll_interval_ms),
            command_timeout: Duration::from_millis(self.command_timeout_ms),
        }
    }

    /// Placement defaults for the splitter.
    #[must_use]
    pub fn placement_settings(&self) -> PlacementSettings {
        PlacementSettings {
            magic: self.magic_number,
            comment_prefix: self.comment_prefix.clone(),
            default_deviation: self.default_deviation,
            default_lot_size: self.default_lot_size,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            magic_number: default_magic_number(),
            comment_prefix: default_comment_prefix(),
            command_poll_interval_ms: default_command_poll_interval_ms(),
            command_timeout_ms: default_command_timeout_ms(),
            scan_interval_ms: default_scan_interval_ms(),
            default_deviation: default_deviation(),
            default_lot_size: default_lot_size(),
        }
    }
}

pub(crate) const fn default_magic_number() -> u64 {
    20_250_117
}

pub(crate) fn default_comment_prefix() -> String {
    "split".to_string()
}

pub(crate) const fn default_command_poll_interval_ms() -> u64 {
    100
}

pub(crate) const fn default_command_timeout_ms() -> u64 {
    50
}

pub(crate) const fn default_scan_interval_ms() -> u64 {
    500
}

pub(crate) const fn default_deviation() -> u32 {
    3
}

pub(crate) const fn default_lot_size() -> Decimal {
    dec!(0.1)
}
