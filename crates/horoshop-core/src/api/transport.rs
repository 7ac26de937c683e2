//! Transport capability: performs exactly one HTTP request.
//!
//! The request pipeline only ever talks to a `Transport`, so tests and
//! embedders can swap the network layer without touching the auth logic.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};

use super::request::Method;
use super::Result;

/// Connect timeout for the default transport.
/// Matches the per-request read timeout so a dead host fails within 15s.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// A fully built request, ready to go on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    /// Form-encoded body, present for every method except GET
    pub body: Option<String>,
    pub timeout: Duration,
}

/// Status code and body of a response. Headers are not exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Network failures are returned as errors and are
    /// never retried by the caller.
    async fn send(&self, request: TransportRequest) -> Result<RawResponse>;
}

/// Default transport backed by `reqwest`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }

    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client, sharing its connection pool
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .header(header::ACCEPT, "application/json")
            .timeout(request.timeout);

        if let Some(body) = request.body {
            builder = builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}
