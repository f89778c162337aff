//! Engine configuration.
//!
//! `config.yaml` (or the file named by `SPLIT_ENGINE_CONFIG`) is read once at
//! startup. `${VAR}` and `${VAR:-fallback}` references are expanded from the
//! environment before parsing, and the parsed tree is checked before any
//! component is built.
//!
//! ```rust,ignore
//! let config = split_order_engine::load_config(Some("deploy/paper.yaml"))?;
//! let symbols = config.symbol_table();
//! ```

mod engine;
mod observability;
mod paper;
mod server;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::shared::Symbol;
use crate::domain::split_order::{SymbolSpec, SymbolTable};

pub use engine::EngineConfig;
pub use observability::{LogFormat, ObservabilityConfig};
pub use paper::{PaperConfig, PaperQuote};
pub use server::ServerConfig;

/// Why a configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be opened or read.
    #[error("cannot read {path}: {source}")]
    ReadError {
        /// File that was requested.
        path: String,
        /// IO failure.
        source: std::io::Error,
    },

    /// The YAML does not match the expected shape.
    #[error("malformed configuration: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// The values parse but cannot be used.
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP bridge configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Engine loop and placement defaults.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Tradable symbols and their venue constants.
    pub symbols: BTreeMap<String, SymbolSpec>,
    /// Paper venue seed data.
    #[serde(default)]
    pub paper: PaperConfig,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Build the symbol lookup used by the use cases.
    #[must_use]
    pub fn symbol_table(&self) -> SymbolTable {
        self.symbols
            .iter()
            .map(|(name, spec)| (Symbol::new(name), spec.clone()))
            .collect()
    }
}

/// Read, expand and validate a configuration file.
///
/// `None` reads `config.yaml` from the working directory.
///
/// # Errors
///
/// See [`ConfigError`].
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_string(),
        source,
    })?;
    load_config_from_string(&raw)
}

/// Expand, parse and validate an in-memory YAML document.
///
/// # Errors
///
/// See [`ConfigError`].
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml_bw::from_str(&expand_env(yaml))?;
    validate_config(&config)?;
    Ok(config)
}

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Replace `${VAR}` / `${VAR:-fallback}` with the environment value.
///
/// Unset and empty variables both take the fallback, or nothing.
#[allow(clippy::expect_used)] // pattern is a literal
fn expand_env(input: &str) -> String {
    static REFERENCE: OnceLock<Regex> = OnceLock::new();
    let reference = REFERENCE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env reference pattern compiles")
    });

    reference
        .replace_all(input, |caps: &Captures<'_>| {
            std::env::var(&caps[1])
                .ok()
                .filter(|value| !value.is_empty())
                .or_else(|| caps.get(2).map(|m| m.as_str().to_string()))
                .unwrap_or_default()
        })
        .into_owned()
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.symbols.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one symbol must be configured".to_string(),
        ));
    }

    for (name, spec) in &config.symbols {
        Symbol::new(name)
            .validate()
            .and_then(|()| spec.validate())
            .map_err(|e| ConfigError::ValidationError(format!("symbols.{name}: {e}")))?;
    }

    let engine = &config.engine;
    if engine.command_poll_interval_ms == 0 || engine.scan_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "engine intervals must be positive".to_string(),
        ));
    }

    if engine.command_timeout_ms > engine.command_poll_interval_ms {
        return Err(ConfigError::ValidationError(
            "command_timeout_ms must not exceed command_poll_interval_ms".to_string(),
        ));
    }

    if engine.comment_prefix.contains('|') {
        return Err(ConfigError::ValidationError(
            "comment_prefix must not contain '|'".to_string(),
        ));
    }

    for (name, quote) in &config.paper.quotes {
        if quote.bid > quote.ask {
            return Err(ConfigError::ValidationError(format!(
                "paper.quotes.{name}: bid must not exceed ask"
            )));
        }
    }

    Ok(())
}
