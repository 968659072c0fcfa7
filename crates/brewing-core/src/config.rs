//! Application configuration management.
//!
//! This module handles loading the application configuration,
//! which holds the auth API base URL and the storage backend for the
//! session token and record.
//!
//! Configuration is stored at `~/.config/brewing-app/config.json`.
//! `BREWING_API_URL` and `BREWING_STORAGE` override the file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::AuthApi;
use crate::auth::SessionManager;
use crate::storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "brewing-app";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Used when neither the config file nor the environment names an API.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

pub const API_URL_ENV: &str = "BREWING_API_URL";
pub const STORAGE_ENV: &str = "BREWING_STORAGE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" | "keychain" => Ok(StorageBackend::Keyring),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageBackend::File => "file",
            StorageBackend::Keyring => "keyring",
            StorageBackend::Memory => "memory",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.with_env_overrides()
    }

    /// Apply `BREWING_API_URL` and `BREWING_STORAGE` on top of the file values.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_url = Some(url);
            }
        }
        if let Ok(backend) = std::env::var(STORAGE_ENV) {
            self.storage = backend.parse()?;
        }
        Ok(self)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Open the configured store. `FileStore` lives under `data_dir`.
    pub fn open_store(&self, data_dir: PathBuf) -> Arc<dyn KeyValueStore> {
        match self.storage {
            StorageBackend::File => Arc::new(FileStore::new(data_dir)),
            StorageBackend::Keyring => Arc::new(KeyringStore::new(APP_NAME)),
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        }
    }

    /// Build the one `SessionManager` the process should share.
    pub fn session_manager(&self) -> Result<SessionManager> {
        let api = AuthApi::new(self.api_url())?;
        let store = self.open_store(Self::data_dir()?);
        Ok(SessionManager::new(api, store))
    }
}
