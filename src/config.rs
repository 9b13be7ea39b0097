use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::FileMirror;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub sync: SyncConfig,
    pub ui: UiConfig,
}

/// Poll store connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the poll API (unset = demo mode with in-memory polls)
    pub base_url: Option<String>,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
}

/// Local snapshot settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Snapshot file (unset = default cache dir)
    pub path: Option<String>,
    /// How often to check the snapshot for writes by other processes
    pub watch_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            watch_interval_ms: 250,
        }
    }
}

impl CacheConfig {
    pub fn resolved_path(&self) -> Result<PathBuf> {
        match self.path {
            Some(ref path) => Ok(PathBuf::from(path)),
            None => FileMirror::default_path(),
        }
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms.max(10))
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Reconciliation tick period in milliseconds
    pub tick_interval_ms: u64,
    /// Buffered in-process updates per listener
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            channel_capacity: 16,
        }
    }
}

impl SyncConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(10))
    }
}

/// UI customization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Chart colors, assigned to options by position
    pub palette: Vec<String>,
    /// Seconds before a status message disappears
    pub status_timeout_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            palette: ["Cyan", "Magenta", "Yellow", "Green", "Blue", "Red", "LightCyan", "LightMagenta"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            status_timeout_secs: 4,
        }
    }
}

impl UiConfig {
    pub fn palette_size(&self) -> usize {
        self.palette.len().max(1)
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("pollsync");

        fs::create_dir_all(&config_dir)
            .context("Failed to create config directory")?;

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from file, or create default if not exists
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .context("Failed to read config file")?;

            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;

            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(&path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    pub fn is_demo(&self) -> bool {
        self.remote.base_url.is_none()
    }
}
