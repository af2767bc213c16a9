//! Simulator configuration.
//!
//! Settings come from an optional JSON file and are then overridden by
//! command-line flags. Every field has a default, so `{}` is a valid file:
//!
//! ```json
//! { "step_limit": 10000, "trace": true, "log_filter": "warn" }
//! ```
//!
//! `"step_limit": null` removes the step budget and restores the unbounded
//! run loop.

use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Default configuration values.
mod defaults {
    /// Instructions a single `run` may execute before it is stopped.
    pub const STEP_LIMIT: u64 = 10_000;

    /// `tracing` filter used when `RUST_LOG` is unset.
    pub const LOG_FILTER: &str = "warn";
}

/// Top-level simulator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Step budget for `run`. `None` runs until PC leaves memory, which
    /// never happens for a program that jumps back on itself.
    #[serde(default = "SimConfig::default_step_limit")]
    pub step_limit: Option<u64>,

    /// Print an `Executing ...` line for every instruction.
    #[serde(default = "SimConfig::default_trace")]
    pub trace: bool,

    /// Log filter directive (`RUST_LOG` syntax).
    #[serde(default = "SimConfig::default_log_filter")]
    pub log_filter: String,
}

impl SimConfig {
    fn default_step_limit() -> Option<u64> {
        Some(defaults::STEP_LIMIT)
    }

    fn default_trace() -> bool {
        true
    }

    fn default_log_filter() -> String {
        defaults::LOG_FILTER.to_string()
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
        Self::from_json(&text)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            step_limit: Self::default_step_limit(),
            trace: Self::default_trace(),
            log_filter: Self::default_log_filter(),
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {0}: {1}")]
    Io(String, String),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
