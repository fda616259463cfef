//! Configuration for plan-analytics.

use crate::core::activity::ActivitySettings;
use crate::core::parallel::default_workers;
use crate::core::time::DayBucketer;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Activity index tunables
    pub activity: ActivitySettings,

    /// IANA timezone used for calendar-day grouping
    pub timezone: String,

    /// Worker threads for per-player computations (0 = all cores)
    pub worker_threads: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            activity: ActivitySettings::default(),
            timezone: "UTC".to_string(),
            worker_threads: 0,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        config.timezone()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("plan-analytics")
            .join("config.json")
    }

    /// Parsed timezone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn day_bucketer(&self) -> Result<DayBucketer, ConfigError> {
        Ok(DayBucketer::new(self.timezone()?))
    }

    /// Effective worker count.
    pub fn workers(&self) -> usize {
        if self.worker_threads == 0 {
            default_workers()
        } else {
            self.worker_threads
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
}
