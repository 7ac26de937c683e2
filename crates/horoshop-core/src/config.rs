//! Configuration management.
//!
//! The configuration holds the store URL, API login, the token store kind
//! and an optional cache directory override. It is stored at
//! `~/.config/horoshop/config.json`. The password is never written to disk;
//! it comes from `HOROSHOP_PASSWORD` or from the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::storage::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "horoshop";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_URL: &str = "HOROSHOP_URL";
pub const ENV_LOGIN: &str = "HOROSHOP_LOGIN";
pub const ENV_PASSWORD: &str = "HOROSHOP_PASSWORD";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub base_url: Option<String>,
    pub login: Option<String>,
    #[serde(default)]
    pub token_store: TokenStoreKind,
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override fields from `HOROSHOP_URL` and `HOROSHOP_LOGIN`
    pub fn with_env(self) -> Self {
        self.with_overrides(std::env::var(ENV_URL).ok(), std::env::var(ENV_LOGIN).ok())
    }

    fn with_overrides(mut self, base_url: Option<String>, login: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|v| !v.is_empty()) {
            self.base_url = Some(url);
        }
        if let Some(login) = login.filter(|v| !v.is_empty()) {
            self.login = Some(login);
        }
        self
    }

    /// Combine the stored URL and login with a password
    pub fn credentials(&self, password: &str) -> crate::api::Result<Credentials> {
        Credentials::new(
            self.base_url.clone().unwrap_or_default(),
            self.login.clone().unwrap_or_default(),
            password,
        )
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Build the configured token store
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        Ok(match self.token_store {
            TokenStoreKind::File => Arc::new(FileTokenStore::new(self.cache_dir()?.join("tokens"))),
            TokenStoreKind::Keyring => Arc::new(KeyringTokenStore::new()),
            TokenStoreKind::Memory => Arc::new(MemoryTokenStore::new()),
        })
    }
}
