use anyhow::{Context, Result};
use ::keyring::Entry;

use super::TokenStore;

const SERVICE_NAME: &str = "horoshop";

/// Token store backed by the OS keychain. The key becomes the entry's user.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Delete the token stored under `key`
    pub fn delete(&self, key: &str) -> Result<()> {
        let entry = Entry::new(&self.service, key).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete token from keychain")?;
        Ok(())
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(&self.service, key).context("Failed to create keyring entry")?;
        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(::keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set(&self, key: &str, token: &str) -> Result<()> {
        let entry = Entry::new(&self.service, key).context("Failed to create keyring entry")?;
        entry
            .set_password(token)
            .context("Failed to store token in keychain")?;
        Ok(())
    }
}
