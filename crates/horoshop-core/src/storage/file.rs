use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TokenStore;

/// Application name used for the default cache directory
const APP_NAME: &str = "horoshop";

/// Sub-directory of the cache directory holding token files
const TOKENS_DIR: &str = "tokens";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    stored_at: DateTime<Utc>,
}

/// Filesystem token store: `<dir>/<key>.json` per key.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform cache directory, e.g. `~/.cache/horoshop/tokens`
    pub fn default_location() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(Self::new(cache_dir.join(APP_NAME).join(TOKENS_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// When the token under `key` was last written
    pub fn stored_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.load(key)?.map(|stored| stored.stored_at))
    }

    fn token_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }

    fn load(&self, key: &str) -> Result<Option<StoredToken>> {
        let path = self.token_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read token file: {}", path.display()))?;
        let stored: StoredToken = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse token file: {}", path.display()))?;

        Ok(Some(stored))
    }
}

/// Fingerprints are hex and used verbatim; anything else is hex encoded
fn file_stem(key: &str) -> String {
    let safe = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if safe {
        key.to_string()
    } else {
        format!("x{}", hex::encode(key.as_bytes()))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load(key)?.map(|stored| stored.token))
    }

    fn set(&self, key: &str, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create token directory: {}", self.dir.display()))?;

        let stored = StoredToken {
            token: token.to_string(),
            stored_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(self.token_path(key), contents).context("Failed to write token file")?;
        Ok(())
    }
}
