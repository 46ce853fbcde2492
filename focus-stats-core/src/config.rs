//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/focus-stats/config.toml`
//!
//! Paths follow the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/focus-stats/` (~/.config/focus-stats/)
//! - Data: `$XDG_DATA_HOME/focus-stats/` (~/.local/share/focus-stats/)
//! - State/Logs: `$XDG_STATE_HOME/focus-stats/` (~/.local/state/focus-stats/)

use crate::cache::DEFAULT_CACHE_KEY;
use crate::error::{Error, Result};
use crate::types::DEFAULT_CACHE_TTL_MS;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "focus-stats";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Stats cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stats cache configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Key of the slot holding the cache blob
    #[serde(default = "default_cache_key")]
    pub key: String,

    /// Lifetime of a written cache, in milliseconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_ms: u64,

    /// Byte quota for the persistence slot (unlimited when unset)
    #[serde(default)]
    pub max_bytes: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: default_cache_key(),
            ttl_ms: default_cache_ttl(),
            max_bytes: None,
        }
    }
}

impl CacheConfig {
    /// Reject values the cache cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(Error::Config("cache.key must not be empty".to_string()));
        }
        if self.ttl_ms == 0 {
            return Err(Error::Config(
                "cache.ttl_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_bytes == Some(0) {
            return Err(Error::Config(
                "cache.max_bytes must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_cache_key() -> String {
    DEFAULT_CACHE_KEY.to_string()
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_MS
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.cache.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/focus-stats/config.toml` (~/.config/focus-stats/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join(APP_DIR).join("config.toml")
    }

    /// Returns the data directory path (for the cache database)
    ///
    /// `$XDG_DATA_HOME/focus-stats/` (~/.local/share/focus-stats/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join(APP_DIR)
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/focus-stats/` (~/.local/state/focus-stats/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join(APP_DIR)
    }

    /// Returns the cache database file path
    ///
    /// `$XDG_DATA_HOME/focus-stats/cache.db` (~/.local/share/focus-stats/cache.db)
    pub fn cache_db_path() -> PathBuf {
        Self::data_dir().join("cache.db")
    }
}
