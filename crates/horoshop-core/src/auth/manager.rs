use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use super::credentials::{Credentials, Fingerprint};
use crate::api::pipeline::Pipeline;
use crate::api::{ApiError, RequestDescriptor, Result};
use crate::storage::TokenStore;

/// Path of the login endpoint, relative to the API root
pub(crate) const AUTH_PATH: &str = "auth";

/// Owns the credentials, the cached session token and the login exchange.
pub struct AuthManager {
    credentials: Credentials,
    fingerprint: Fingerprint,
    store: Arc<dyn TokenStore>,
    token: RwLock<Option<String>>,
    api_unavailable: AtomicBool,
}

impl AuthManager {
    /// Build a manager with whatever token the store already holds.
    /// No network traffic happens here.
    pub fn new(credentials: Credentials, store: Arc<dyn TokenStore>) -> Self {
        let fingerprint = credentials.fingerprint();
        let cached = match store.get(fingerprint.as_str()) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read cached token, logging in again");
                None
            }
        };

        Self {
            credentials,
            fingerprint,
            store,
            token: RwLock::new(cached),
            api_unavailable: AtomicBool::new(false),
        }
    }

    /// Load the cached token, or log in right away when there is none.
    /// Fails with `Connection` when that login is rejected.
    pub(crate) async fn initialize(
        credentials: Credentials,
        store: Arc<dyn TokenStore>,
        pipeline: &Pipeline,
    ) -> Result<Self> {
        let manager = Self::new(credentials, store);
        if manager.current_token().await.is_some() {
            return Ok(manager);
        }

        match manager.login(pipeline).await {
            Ok(true) => return Ok(manager),
            Ok(false) => {}
            Err(ApiError::InvalidResponse(message)) => return Err(ApiError::Connection(message)),
            Err(e) => return Err(e),
        }

        if manager.is_api_unavailable() {
            return Err(ApiError::ApiUnavailable);
        }
        Err(match pipeline.last_response() {
            Some(last) => ApiError::login_rejected(last.status, &last.body),
            None => ApiError::Connection("no response from the authentication endpoint".into()),
        })
    }

    /// Exchange the credentials for a fresh token.
    ///
    /// Returns `Ok(false)` for any non-200 answer. A 404 means API access is
    /// switched off for the store and marks this manager unavailable.
    pub(crate) async fn login(&self, pipeline: &Pipeline) -> Result<bool> {
        let descriptor = RequestDescriptor::post(AUTH_PATH)
            .param("login", self.credentials.login())
            .param("password", self.credentials.password())
            .without_token();

        let response = pipeline.send(&descriptor, None).await?;

        if !response.is(200) {
            if response.is(404) {
                warn!("Authentication endpoint not found, marking API unavailable");
                self.api_unavailable.store(true, Ordering::SeqCst);
            } else {
                warn!(status = response.status, "Authentication rejected");
            }
            return Ok(false);
        }

        let token = match response.lookup("/response/token").and_then(|t| t.as_str()) {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                return Err(ApiError::InvalidResponse(format!(
                    "authentication response has no token: {}",
                    ApiError::truncate_body(&response.raw_body)
                )))
            }
        };

        if let Err(e) = self.store.set(self.fingerprint.as_str(), &token) {
            warn!(error = %e, "Failed to persist token, keeping it in memory only");
        }
        *self.token.write().await = Some(token);

        info!(login = %self.credentials.login(), "Authenticated with Horoshop API");
        Ok(true)
    }

    pub async fn current_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn is_api_unavailable(&self) -> bool {
        self.api_unavailable.load(Ordering::SeqCst)
    }
}
