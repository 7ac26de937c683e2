//! Client library for the Horoshop REST API.
//!
//! The client exchanges a login and password for a session token, keeps that
//! token in a pluggable [`TokenStore`] keyed by a credential fingerprint, and
//! re-authenticates once when the remote side rejects a request with 401.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use horoshop_core::{ApiClient, Credentials, FileTokenStore};
//!
//! let credentials = Credentials::new("https://shop.example", "api", "secret")?;
//! let store = Arc::new(FileTokenStore::default_location()?);
//! let client = ApiClient::connect(credentials, store).await?;
//!
//! if let Some(order) = client.get_order_by_id(42).await? {
//!     println!("order {}", order.id);
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{
    ApiClient, ApiError, ClientOptions, LastResponse, Method, RawResponse, ReqwestTransport,
    RequestDescriptor, ResponseEnvelope, Result, Transport, TransportRequest,
};
pub use auth::{AuthManager, Credentials, Fingerprint};
pub use config::{Config, TokenStoreKind};
pub use models::{CatalogQuery, Order, OrderFilters, Product};
pub use storage::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};
