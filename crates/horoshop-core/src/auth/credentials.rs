use std::fmt;

use sha2::{Digest, Sha256};

use crate::api::{ApiError, Result};

/// Store URL, login and password used to obtain a session token.
/// Trailing slashes are stripped from the URL.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    endpoint_base: String,
    login: String,
    password: String,
}

impl Credentials {
    /// Validate and build credentials. All three values must be non-empty.
    pub fn new(
        endpoint_base: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let endpoint_base = endpoint_base
            .into()
            .trim()
            .trim_end_matches('/')
            .to_string();
        let login = login.into();
        let password = password.into();

        let mut missing = Vec::new();
        if endpoint_base.is_empty() {
            missing.push("endpoint base");
        }
        if login.is_empty() {
            missing.push("login");
        }
        if password.is_empty() {
            missing.push("password");
        }
        if !missing.is_empty() {
            return Err(ApiError::Configuration(format!(
                "empty {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            endpoint_base,
            login,
            password,
        })
    }

    pub fn endpoint_base(&self) -> &str {
        &self.endpoint_base
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Root of the REST API, `<base>/api`
    pub fn api_root(&self) -> String {
        format!("{}/api", self.endpoint_base)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint_base", &self.endpoint_base)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SHA-256 of `endpoint_base:login:password`, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(credentials: &Credentials) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(credentials.endpoint_base.as_bytes());
        hasher.update(b":");
        hasher.update(credentials.login.as_bytes());
        hasher.update(b":");
        hasher.update(credentials.password.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
