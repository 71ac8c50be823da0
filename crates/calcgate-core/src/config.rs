//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the gateway URL, request timeout, session backend, expiry polling and the
//! last used username.
//!
//! Configuration is stored at `~/.config/calcgate/config.json`. A few values
//! can be overridden from the environment (or a `.env` file).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "calcgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Gateway the client talks to unless configured otherwise
pub const DEFAULT_API_URL: &str = "https://gateway-api-d161ff47e128.herokuapp.com";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// How often an open protected view re-checks token expiry
const DEFAULT_EXPIRY_CHECK_SECS: u64 = 30;

pub const ENV_API_URL: &str = "CALCGATE_API_URL";
pub const ENV_USERNAME: &str = "CALCGATE_USERNAME";
pub const ENV_PASSWORD: &str = "CALCGATE_PASSWORD";

/// Where the session record is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub session_backend: SessionBackend,
    /// 0 disables polling; expiry is then only checked on navigation
    pub expiry_check_interval_secs: u64,
    pub last_username: Option<String>,
    pub remember_password: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_backend: SessionBackend::File,
            expiry_check_interval_secs: DEFAULT_EXPIRY_CHECK_SECS,
            last_username: None,
            remember_password: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session file and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
