//! Rig configuration types and TOML loading.
//!
//! A rig configuration file describes one simulation run: the modeled RAM
//! geometry knobs that must stay in sync with the RTL configuration, the
//! runtime limit, and the optional waveform path.
//!
//! # TOML Example
//!
//! ```toml
//! [ram]
//! freq_mhz = 143.0
//! cas_latency = 3
//! burst_length = 1
//!
//! [sim]
//! runtime_us = 0          # 0 = unbounded
//! vcd = "trace.vcd"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Modeled RAM knobs. These mirror the RTL configuration of the design under
/// test and must be kept in sync with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RamConfig {
    /// SDRAM clock frequency [MHz].
    #[serde(default = "default_freq_mhz")]
    pub freq_mhz: f64,
    /// CAS latency programmed at mode-register-set time.
    #[serde(default = "default_cas_latency")]
    pub cas_latency: u8,
    /// Burst length programmed at mode-register-set time.
    #[serde(default = "default_burst_length")]
    pub burst_length: u8,
}

fn default_freq_mhz() -> f64 {
    143.0
}

fn default_cas_latency() -> u8 {
    3
}

fn default_burst_length() -> u8 {
    1
}

impl Default for RamConfig {
    fn default() -> Self {
        Self {
            freq_mhz: default_freq_mhz(),
            cas_latency: default_cas_latency(),
            burst_length: default_burst_length(),
        }
    }
}

impl RamConfig {
    /// Validate the RAM knobs.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `freq_mhz` is outside (0, 500]
    /// - `cas_latency` is not 2 or 3
    /// - `burst_length` is not one of 1, 2, 4, 8
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.freq_mhz > 0.0 && self.freq_mhz <= 500.0) {
            return Err(ConfigError::ValidationError(format!(
                "freq_mhz must be in (0, 500], got {}",
                self.freq_mhz
            )));
        }
        if !matches!(self.cas_latency, 2 | 3) {
            return Err(ConfigError::ValidationError(format!(
                "cas_latency must be 2 or 3, got {}",
                self.cas_latency
            )));
        }
        if !matches!(self.burst_length, 1 | 2 | 4 | 8) {
            return Err(ConfigError::ValidationError(format!(
                "burst_length must be 1, 2, 4 or 8, got {}",
                self.burst_length
            )));
        }
        Ok(())
    }
}

/// Simulation run parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    /// Runtime limit [µs]. 0 means unbounded (run until finish is requested).
    #[serde(default)]
    pub runtime_us: u64,
    /// Optional waveform output path. Tracing stays off when absent.
    #[serde(default)]
    pub vcd: Option<PathBuf>,
}

/// Complete rig configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigConfig {
    /// Modeled RAM knobs.
    #[serde(default)]
    pub ram: RamConfig,
    /// Simulation run parameters.
    #[serde(default)]
    pub sim: SimConfig,
}

impl RigConfig {
    /// Load and validate a rig configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// - `ConfigError::FileNotFound` if the file does not exist
    /// - `ConfigError::ParseError` on invalid TOML
    /// - `ConfigError::ValidationError` on out-of-range values
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "rig configuration loaded");
        Ok(config)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ram.validate()
    }
}
