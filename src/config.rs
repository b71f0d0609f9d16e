//! Application configuration
//!
//! Stored as TOML under `<config dir>/gcpoller/config.toml`. Every field has
//! a default, so a partial file is valid and a missing file is recreated
//! with defaults on first start.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::input::ThresholdMode;

const CONFIG_DIR: &str = "gcpoller";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Frequencies of the two emulated cycle domains.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ClockConfig {
    /// Emulated CPU frequency in Hz
    pub cpu_frequency: u32,
    /// Emulated peripheral counter frequency in Hz
    pub clock_frequency: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            cpu_frequency: 1_020_000_000,
            clock_frequency: 19_200_000,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub axis_threshold_mode: ThresholdMode,
    /// Used for analog bindings that carry no `deadzone`
    pub analog_deadzone: f32,
    pub capture_poll_interval_ms: u64,
    pub capture_timeout_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            axis_threshold_mode: ThresholdMode::Fixed,
            analog_deadzone: 0.0,
            capture_poll_interval_ms: 10,
            capture_timeout_ms: 5_000,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ProducerConfig {
    /// Sample script replayed into the adapter; a built-in demo when unset
    pub script: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct GcConfig {
    pub clock: ClockConfig,
    pub input: InputConfig,
    pub producer: ProducerConfig,
}

impl GcConfig {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path`, writing a default file first if none exists.
    pub fn ensure_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No configuration at {}, writing defaults", path.display());
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock.cpu_frequency == 0 {
            return Err(ConfigError::Invalid(
                "clock.cpu_frequency must be positive".to_string(),
            ));
        }
        if self.clock.clock_frequency == 0 {
            return Err(ConfigError::Invalid(
                "clock.clock_frequency must be positive".to_string(),
            ));
        }
        if !self.input.analog_deadzone.is_finite() {
            return Err(ConfigError::Invalid(
                "input.analog_deadzone must be a number".to_string(),
            ));
        }
        if self.input.capture_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "input.capture_poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
