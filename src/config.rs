//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, RoverError};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Remote rover API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Durable observation log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_path")]
    pub path: String,
}

/// Polling and command policy configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_low_battery_threshold")]
    pub low_battery_threshold: f64,
}

/// Diagnostics (tracing file output) configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DiagnosticsConfig {
    /// Directory for rolling diagnostic logs, empty disables them
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_base_url() -> String { "https://roverdata2-production.up.railway.app/api".to_string() }
fn default_timeout_ms() -> u64 { 5000 }

fn default_log_path() -> String { "rover_sensor_log.txt".to_string() }

fn default_poll_interval_ms() -> u64 { 1000 }
fn default_low_battery_threshold() -> f64 { 10.0 }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { path: default_log_path() }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            low_battery_threshold: default_low_battery_threshold(),
        }
    }
}

impl ApiConfig {
    /// Transport timeout applied to every request
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ControlConfig {
    /// Fixed interval between polling cycles
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rover_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(invalid("api base_url cannot be empty"));
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(invalid("api base_url must start with http:// or https://"));
        }

        if self.api.timeout_ms == 0 || self.api.timeout_ms > 60000 {
            return Err(invalid("timeout_ms must be between 1 and 60000"));
        }

        if self.log.path.is_empty() {
            return Err(invalid("log path cannot be empty"));
        }

        if self.control.poll_interval_ms == 0 || self.control.poll_interval_ms > 60000 {
            return Err(invalid("poll_interval_ms must be between 1 and 60000"));
        }

        // NaN fails both comparisons, so check the accepted range positively
        if !(0.0..=100.0).contains(&self.control.low_battery_threshold) {
            return Err(invalid("low_battery_threshold must be between 0.0 and 100.0"));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> RoverError {
    RoverError::Config(toml::de::Error::custom(msg))
}
