//! TOML file configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub port: Option<u16>,
    /// Base URL clients reach this server at, e.g. "https://feeds.example.com".
    pub endpoint_base: Option<String>,
    pub requests_logging_level: Option<String>,
    /// Feed the feed-alert notifier posts into.
    pub alerts_feed: Option<String>,
    pub pushover: Option<PushoverFileConfig>,
    /// Per-job cron schedule overrides, keyed by job name.
    pub schedules: Option<HashMap<String, String>>,
    pub freshness: Option<Vec<FreshnessFileRule>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushoverFileConfig {
    pub token: Option<String>,
    pub user_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FreshnessFileRule {
    pub feed: String,
    /// Human-readable duration, e.g. "1h" or "2days".
    pub max_age: String,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path.as_ref()))
    }
}
