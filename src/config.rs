// src/config.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Startup configuration. Immutable for the lifetime of a scheduler;
/// changing the rates or the key means stopping the scheduler and
/// constructing a new one.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    pub api_key: String,
    pub base_url: String,
    pub quote_rate_secs: u64,
    pub news_rate_secs: u64,
    /// Minimum price move that triggers a popup. Absent means price pops
    /// are off and only news notifies.
    #[serde(default)]
    pub price_alert_epsilon: Option<f64>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_watchlist_file")]
    pub watchlist_file: PathBuf,
}

fn default_watchlist_file() -> PathBuf {
    PathBuf::from("watchlist.json")
}

/// Load configuration from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RefreshConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    load_config_from_str(&raw)
}

/// Load configuration from a JSON string.
pub fn load_config_from_str(raw: &str) -> Result<RefreshConfig, ConfigError> {
    let config: RefreshConfig = serde_json::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

impl RefreshConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("api_key must not be empty".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.quote_rate_secs == 0 {
            return Err(ConfigError::Invalid(
                "quote_rate_secs must be positive".into(),
            ));
        }
        if self.news_rate_secs == 0 {
            return Err(ConfigError::Invalid(
                "news_rate_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn quote_interval(&self) -> Duration {
        Duration::from_secs(self.quote_rate_secs)
    }

    pub fn news_interval(&self) -> Duration {
        Duration::from_secs(self.news_rate_secs)
    }
}
