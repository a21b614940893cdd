//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! where the API lives, how connectivity is probed, where the cache and logs
//! go, and which teams were last selected.
//!
//! Configuration is stored at `~/.config/matchday/config.json`. A few fields
//! can be overridden from the environment (or a `.env` file loaded by the
//! binary) without touching the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS};
use crate::connectivity::DEFAULT_PROBE_INTERVAL_SECS;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "matchday";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Where the reachability probe connects by default
pub const DEFAULT_PROBE_HOST: &str = "jmde6xvjr4.execute-api.us-east-1.amazonaws.com:443";

pub const ENV_BASE_URL: &str = "MATCHDAY_BASE_URL";
pub const ENV_CACHE_DIR: &str = "MATCHDAY_CACHE_DIR";
pub const ENV_PROBE_HOST: &str = "MATCHDAY_PROBE_HOST";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// `host:port` the connectivity probe connects to
    pub probe_host: String,
    pub probe_interval_secs: u64,
    pub cache_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    /// Team filter remembered from the last run
    pub selected_teams: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            probe_host: DEFAULT_PROBE_HOST.to_string(),
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            cache_dir: None,
            log_dir: None,
            selected_teams: Vec::new(),
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from `path`, or defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Override fields from variables that are set and non-empty.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(host) = lookup(ENV_PROBE_HOST) {
            self.probe_host = host;
        }
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}
