//! Configuration loading for wearlink.
//!
//! Configuration is loaded from TOML. Every field has a default, so an
//! empty document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wearlink_types::{MetricKind, BATTERY_PATH, HEALTH_PATH};

/// Sync layer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Milliseconds between sampling passes (default: 5000).
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    /// Events buffered per subscriber before it lags (default: 256).
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Replications queued per peer before new ones are dropped (default: 64).
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
    /// Re-send all data items to a peer that asks for a sync (default: true).
    #[serde(default = "default_respond_to_sync")]
    pub respond_to_sync: bool,
    /// Paths replicated ahead of normal traffic (default: battery and health).
    #[serde(default = "default_urgent_paths")]
    pub urgent_paths: Vec<String>,
    /// Metrics sampled each pass (default: all).
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricKind>,
}

// Default value functions
fn default_sample_interval_ms() -> u64 {
    5_000
}

fn default_event_capacity() -> usize {
    256
}

fn default_outbox_capacity() -> usize {
    64
}

fn default_respond_to_sync() -> bool {
    true
}

fn default_urgent_paths() -> Vec<String> {
    vec![BATTERY_PATH.to_string(), HEALTH_PATH.to_string()]
}

fn default_metrics() -> Vec<MetricKind> {
    MetricKind::ALL.to_vec()
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
            event_capacity: default_event_capacity(),
            outbox_capacity: default_outbox_capacity(),
            respond_to_sync: default_respond_to_sync(),
            urgent_paths: default_urgent_paths(),
            metrics: default_metrics(),
        }
    }
}

impl LinkConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: Some(path.to_path_buf()),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError { path: None, source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeError)
    }

    /// Interval between sampling passes.
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::Invalid("sample_interval_ms must be positive".into()));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be positive".into()));
        }
        if self.outbox_capacity == 0 {
            return Err(ConfigError::Invalid("outbox_capacity must be positive".into()));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration.
    #[error("failed to parse config{}: {source}", .path.as_ref().map(|p| format!(" file {}", p.display())).unwrap_or_default())]
    ParseError {
        /// Path to the configuration file, if loaded from one.
        path: Option<PathBuf>,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// Failed to render configuration.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] toml::ser::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}
