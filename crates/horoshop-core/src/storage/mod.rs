//! Token persistence.
//!
//! A `TokenStore` keeps the session token between client instances, keyed by
//! the credential fingerprint. Three adapters ship with the crate:
//! - `FileTokenStore`: one JSON file per fingerprint in the cache directory
//! - `MemoryTokenStore`: process-local map, for request-scoped reuse
//! - `KeyringTokenStore`: OS keychain via the `keyring` crate
//!
//! Store failures never fail an API call. The client logs them and carries
//! on with the token it holds in memory.

pub mod file;
pub mod keyring;
pub mod memory;

use anyhow::Result;

pub use self::file::FileTokenStore;
pub use self::keyring::KeyringTokenStore;
pub use self::memory::MemoryTokenStore;

pub trait TokenStore: Send + Sync {
    /// Fetch the token saved under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Save `token` under `key`, replacing any previous value
    fn set(&self, key: &str, token: &str) -> Result<()>;
}
