//! Authentication module for managing API credentials and the session token.
//!
//! This module provides:
//! - `Credentials`: validated store URL, login and password
//! - `Fingerprint`: stable hash of the credentials, used as the token cache key
//! - `AuthManager`: owns the cached token and performs the login exchange
//!
//! Tokens have no local expiry. They are replaced only when the API answers
//! a request with 401.

pub mod credentials;
pub mod manager;

pub use credentials::{Credentials, Fingerprint};
pub use manager::AuthManager;
