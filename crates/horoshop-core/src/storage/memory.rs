use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::TokenStore;

/// In-memory token store. Tokens live as long as the store does.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let tokens = self
            .tokens
            .lock()
            .map_err(|_| anyhow!("Token map lock poisoned"))?;
        Ok(tokens.get(key).cloned())
    }

    fn set(&self, key: &str, token: &str) -> Result<()> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|_| anyhow!("Token map lock poisoned"))?;
        tokens.insert(key.to_string(), token.to_string());
        Ok(())
    }
}
