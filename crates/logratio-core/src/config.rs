//! `logratio` Configuration Module
//!
//! Provides configuration file support via `logratio.toml`, environment variables,
//! and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (CLI flags)
//! 2. Environment variables (`LOGRATIO_*`, sections separated by `__`,
//!    e.g. `LOGRATIO_REPORT__BATCH_SIZE=1024`)
//! 3. Configuration file (`logratio.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Smallest accepted read buffer.
pub const MIN_READ_BUFFER_BYTES: usize = 4096;
/// Largest accepted read buffer (1 GiB).
pub const MAX_READ_BUFFER_BYTES: usize = 1 << 30;
/// Largest accepted per-user counter size hint.
pub const MAX_INITIAL_SLOTS: usize = 1 << 20;
/// Largest accepted report batch, in rows.
pub const MAX_BATCH_SIZE: usize = 1 << 20;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// How per-user counters are laid out in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// One contiguous counter array per user, pre-sized to the global
    /// endpoint count after the sizing pass.
    Dense,
    /// One map per user holding only the endpoints that user touched (default).
    #[default]
    Sparse,
}

/// Which (user, endpoint) rows end up in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSelection {
    /// Only pairs with at least one log line (default).
    #[default]
    Observed,
    /// Every user crossed with every endpoint seen anywhere in the file.
    /// Unvisited pairs report `inf`.
    CrossProduct,
}

/// Aggregation pipeline configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Size of the buffered read window in bytes.
    pub read_buffer_bytes: usize,
    /// Growth factor applied when a dense counter array has to grow.
    pub growth_multiplier: f64,
    /// Per-user counter size hint used during the sizing pass.
    pub initial_slots: usize,
    /// Counter layout.
    pub storage: StorageMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            read_buffer_bytes: 8 * 1024 * 1024,
            growth_multiplier: 1.5,
            initial_slots: 16,
            storage: StorageMode::Sparse,
        }
    }
}

/// Report output configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rows buffered before each write to the sink.
    pub batch_size: usize,
    /// Row selection policy.
    pub rows: RowSelection,
    /// Fixed number of decimals for finite ratios (`None` = shortest exact form).
    pub ratio_precision: Option<usize>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            batch_size: 4096,
            rows: RowSelection::Observed,
            ratio_precision: None,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `logratio` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Pipeline configuration.
    pub pipeline: PipelineConfig,
    /// Report configuration.
    pub report: ReportConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl AggregatorConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("logratio.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("LOGRATIO_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let read_buffer = self.pipeline.read_buffer_bytes;
        if !(MIN_READ_BUFFER_BYTES..=MAX_READ_BUFFER_BYTES).contains(&read_buffer) {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.read_buffer_bytes".to_string(),
                message: format!(
                    "value {read_buffer} is out of range [{MIN_READ_BUFFER_BYTES}, {MAX_READ_BUFFER_BYTES}]"
                ),
            });
        }

        if self.pipeline.initial_slots > MAX_INITIAL_SLOTS {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.initial_slots".to_string(),
                message: format!(
                    "value {} must be <= {MAX_INITIAL_SLOTS}",
                    self.pipeline.initial_slots
                ),
            });
        }

        let growth = self.pipeline.growth_multiplier;
        if !(1.0..=4.0).contains(&growth) {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.growth_multiplier".to_string(),
                message: format!("value {growth} is out of range [1.0, 4.0]"),
            });
        }

        let batch_size = self.report.batch_size;
        if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(ConfigError::InvalidValue {
                key: "report.batch_size".to_string(),
                message: format!("value {batch_size} is out of range [1, {MAX_BATCH_SIZE}]"),
            });
        }

        if let Some(precision) = self.report.ratio_precision {
            if precision > 17 {
                return Err(ConfigError::InvalidValue {
                    key: "report.ratio_precision".to_string(),
                    message: format!("value {precision} is out of range [0, 17]"),
                });
            }
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
