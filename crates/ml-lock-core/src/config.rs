//! Lock configuration
//!
//! Optional TOML file next to the credential store. Every field has a
//! default, so a missing file is the normal case.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::store::{config_dir, CONFIG_DIR_NAME};

/// Configuration file name
const CONFIG_FILE_NAME: &str = "lock.toml";

/// Timing and path settings for a lock session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Seconds the entry field stays detached after a failed attempt
    pub cooldown_secs: u32,

    /// Raise/topmost re-assertion period (stacking environments)
    pub raise_interval_ms: u64,

    /// Fullscreen double-check period
    pub fullscreen_interval_ms: u64,

    /// Entry focus re-assertion period
    pub focus_interval_ms: u64,

    /// Delay before the one-shot security setup runs
    pub setup_delay_ms: u64,

    /// Elapsed-session clock redraw period
    pub clock_interval_ms: u64,

    /// Upper bound on a single environment directive
    pub directive_timeout_ms: u64,

    /// Directory holding background images
    pub image_dir: PathBuf,

    /// Log file used while the terminal is locked
    pub log_file: PathBuf,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 3,
            raise_interval_ms: 500,
            fullscreen_interval_ms: 1000,
            focus_interval_ms: 100,
            setup_delay_ms: 100,
            clock_interval_ms: 1000,
            directive_timeout_ms: 2000,
            image_dir: default_image_dir(),
            log_file: default_log_file(),
        }
    }
}

fn default_image_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join("img")
}

fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CONFIG_DIR_NAME)
        .join("ml-lock.log")
}

impl LockConfig {
    /// Get the full config file path
    pub fn config_file_path() -> Option<PathBuf> {
        config_dir().map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location
    ///
    /// Returns the default configuration if the file doesn't exist or is
    /// invalid.
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!("Ignoring config file: {}", e);
            Self::default()
        })
    }

    /// Load from the default location, reporting a broken file
    ///
    /// A missing file is not an error.
    pub fn try_load() -> Result<Self, ConfigError> {
        match Self::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load and validate a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would stall enforcement
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cooldown_secs == 0 {
            return Err(ConfigError::Invalid("cooldown_secs must be at least 1".into()));
        }
        let intervals = [
            ("raise_interval_ms", self.raise_interval_ms),
            ("fullscreen_interval_ms", self.fullscreen_interval_ms),
            ("focus_interval_ms", self.focus_interval_ms),
            ("clock_interval_ms", self.clock_interval_ms),
            ("directive_timeout_ms", self.directive_timeout_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
            }
        }
        Ok(())
    }

    pub fn raise_interval(&self) -> Duration {
        Duration::from_millis(self.raise_interval_ms)
    }

    pub fn fullscreen_interval(&self) -> Duration {
        Duration::from_millis(self.fullscreen_interval_ms)
    }

    pub fn focus_interval(&self) -> Duration {
        Duration::from_millis(self.focus_interval_ms)
    }

    pub fn setup_delay(&self) -> Duration {
        Duration::from_millis(self.setup_delay_ms)
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.clock_interval_ms)
    }

    pub fn directive_timeout(&self) -> Duration {
        Duration::from_millis(self.directive_timeout_ms)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
