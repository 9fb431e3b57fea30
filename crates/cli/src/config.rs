// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is stored in `.msync/config.toml` and includes:
//! - `api_url`: Root of the marketplace REST API
//! - `data_dir`: Optional path to store the database and logs elsewhere
//! - `[push]`, `[connectivity]`, `[replay]`, `[cache]`: engine tuning
//!
//! `MSYNC_API_URL`, `MSYNC_PUSH_URL` and `MSYNC_DATA_DIR` override the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{ConnectionConfig, EngineConfig, ReplayPolicy};

pub const CONFIG_DIR_NAME: &str = ".msync";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "sync.db";
const LOG_FILE_NAME: &str = "msync.log";
const LOCK_FILE_NAME: &str = "msync.lock";
const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Default API root written by `msync init`.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Client configuration stored in `.msync/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root of the REST API, e.g. `https://market.example.com/api`.
    pub api_url: String,
    /// Optional path for the database and logs (relative to the project
    /// root, `~/`-prefixed, or absolute).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Push channel settings. Without a URL the engine runs without push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushConfig {
    /// WebSocket URL (`ws://` or `wss://`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Consecutive failed connection attempts before giving up (0 = never).
    #[serde(default = "default_reconnect_max_retries")]
    pub reconnect_max_retries: u32,
    /// Maximum delay between reconnection attempts in seconds.
    #[serde(default = "default_reconnect_max_delay_secs")]
    pub reconnect_max_delay_secs: u64,
    /// First backoff delay in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

/// Health probe settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// URL polled to decide whether the server is reachable.
    /// Defaults to `<api_url>/health`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_url: Option<String>,
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

/// Queue replay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Retries after the first attempt before an item is marked failed.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Periodic drain while online, in seconds.
    #[serde(default = "default_drain_interval_secs")]
    pub drain_interval_secs: u64,
    /// Bound on each request, in seconds.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_reconnect_max_retries() -> u32 {
    10
}

fn default_reconnect_max_delay_secs() -> u64 {
    30
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_probe_interval_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_drain_interval_secs() -> u64 {
    30
}

fn default_attempt_timeout_secs() -> u64 {
    15
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for PushConfig {
    fn default() -> Self {
        PushConfig {
            url: None,
            reconnect_max_retries: default_reconnect_max_retries(),
            reconnect_max_delay_secs: default_reconnect_max_delay_secs(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        ConnectivityConfig {
            health_url: None,
            probe_interval_ms: default_probe_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            max_retries: default_max_retries(),
            drain_interval_secs: default_drain_interval_secs(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            default_ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Config {
    /// Creates a config with default tuning for the given API root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is not http(s).
    pub fn new(api_url: &str) -> Result<Self> {
        let config = Config {
            api_url: api_url.trim_end_matches('/').to_string(),
            data_dir: None,
            push: PushConfig::default(),
            connectivity: ConnectivityConfig::default(),
            replay: ReplayConfig::default(),
            cache: CacheConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks URLs and intervals.
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "invalid api_url '{}': must start with http:// or https://",
                self.api_url
            )));
        }
        if let Some(url) = &self.push.url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(Error::Config(format!(
                    "invalid push url '{}': must start with ws:// or wss://",
                    url
                )));
            }
        }
        if self.replay.drain_interval_secs == 0
            || self.cache.sweep_interval_secs == 0
            || self.connectivity.probe_interval_ms == 0
        {
            return Err(Error::Config("intervals must be greater than zero".into()));
        }
        Ok(())
    }

    /// Loads configuration from the given `.msync/` directory.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the given `.msync/` directory.
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Applies `MSYNC_API_URL` and `MSYNC_PUSH_URL` if set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(url) = env::api_url() {
            self.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = env::push_url() {
            self.push.url = Some(url);
        }
        self.validate()?;
        Ok(self)
    }

    /// URL polled by the connectivity probe.
    pub fn health_url(&self) -> String {
        self.connectivity
            .health_url
            .clone()
            .unwrap_or_else(|| format!("{}/health", self.api_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.replay.attempt_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.connectivity.probe_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.connectivity.probe_timeout_ms)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.default_ttl_secs)
    }

    /// Engine timing derived from the `[replay]` and `[cache]` sections.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            drain_interval: Duration::from_secs(self.replay.drain_interval_secs),
            sweep_interval: Duration::from_secs(self.cache.sweep_interval_secs),
            policy: ReplayPolicy {
                max_retries: self.replay.max_retries,
                attempt_timeout: self.request_timeout(),
            },
            default_ttl: self.default_ttl(),
        }
    }

    /// Push listener settings, or `None` when no push URL is configured.
    pub fn connection_config(&self) -> Option<ConnectionConfig> {
        self.push.url.as_ref().map(|url| ConnectionConfig {
            url: url.clone(),
            max_retries: self.push.reconnect_max_retries,
            max_delay_secs: self.push.reconnect_max_delay_secs,
            initial_delay_ms: self.push.initial_delay_ms,
        })
    }
}

/// Find the `.msync` directory by walking up from the current directory.
pub fn find_config_dir() -> Result<PathBuf> {
    find_config_dir_from(&std::env::current_dir()?)
}

/// Find the `.msync` directory by walking up from `start`.
pub fn find_config_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let config_dir = current.join(CONFIG_DIR_NAME);
        if config_dir.is_dir() {
            return Ok(config_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Directory holding the database, log and lock file.
///
/// `MSYNC_DATA_DIR` wins over the config file.
pub fn get_data_dir(config_dir: &Path, config: &Config) -> PathBuf {
    resolve_data_dir(config_dir, config, env::data_dir())
}

/// Resolves the data directory given an explicit override.
pub fn resolve_data_dir(config_dir: &Path, config: &Config, env_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_dir {
        return dir;
    }
    match &config.data_dir {
        Some(data_dir) => {
            if let Some(rest) = data_dir.strip_prefix("~/") {
                if let Some(home) = dirs::home_dir() {
                    return home.join(rest);
                }
            }
            let data_path = Path::new(data_dir);
            if data_path.is_absolute() {
                data_path.to_path_buf()
            } else {
                // Relative to config_dir's parent (the project root)
                config_dir.parent().unwrap_or(config_dir).join(data_dir)
            }
        }
        None => config_dir.to_path_buf(),
    }
}

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE_NAME)
}

pub fn lock_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOCK_FILE_NAME)
}

/// Initialize a new `.msync` directory at the given path.
pub fn init_config_dir(path: &Path, config: &Config) -> Result<PathBuf> {
    let config_dir = path.join(CONFIG_DIR_NAME);

    if config_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(config_dir.display().to_string()));
    }

    fs::create_dir_all(&config_dir)?;
    config.save(&config_dir)?;
    write_gitignore(&config_dir)?;

    Ok(config_dir)
}

/// Keeps local state out of version control.
fn write_gitignore(config_dir: &Path) -> Result<()> {
    let content = "# Local sync state\nsync.db*\nmsync.log\nmsync.lock\n";
    fs::write(config_dir.join(GITIGNORE_FILE_NAME), content)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
