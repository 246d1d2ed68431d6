//! Configuration management for job-sync.
//!
//! Loads configuration from a TOML file; command-line flags override
//! individual fields afterwards.

use crate::utils::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// CI server base URL
    #[serde(default = "default_server_url")]
    pub url: String,

    /// User for HTTP basic auth
    #[serde(default)]
    pub user: Option<String>,

    /// API token (or password) paired with `user`
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backup directory holding one `<job>/config.xml` per job
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum number of jobs talking to the server at once
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_store_root() -> PathBuf {
    PathBuf::from("pipeline")
}

fn default_max_concurrent_jobs() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            user: None,
            token: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Check the values every component relies on.
    pub fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            return Err(SyncError::Config("server.url must not be empty".to_string()));
        }
        reqwest::Url::parse(&self.server.url)
            .map_err(|e| SyncError::Config(format!("server.url {}: {}", self.server.url, e)))?;

        if self.sync.max_concurrent_jobs == 0 {
            return Err(SyncError::Config(
                "sync.max_concurrent_jobs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Basic-auth credentials, only when both halves are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.server.user, &self.server.token) {
            (Some(user), Some(token)) => Some((user.as_str(), token.as_str())),
            _ => None,
        }
    }
}
