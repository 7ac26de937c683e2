//! Single-attempt request execution.
//!
//! `Pipeline` turns a `RequestDescriptor` into a `TransportRequest`, sends it
//! and wraps the answer in a `ResponseEnvelope`. It knows nothing about
//! re-authentication; `ApiClient::execute` layers the 401 retry on top.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use super::request::{encode_params, RequestDescriptor, ResponseEnvelope};
use super::transport::{Transport, TransportRequest};
use super::Result;

/// Status and raw body of the most recent exchange, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastResponse {
    pub status: u16,
    pub body: String,
}

pub(crate) struct Pipeline {
    transport: Arc<dyn Transport>,
    api_root: String,
    timeout: Duration,
    last: Mutex<Option<LastResponse>>,
}

impl Pipeline {
    pub(crate) fn new(transport: Arc<dyn Transport>, api_root: String, timeout: Duration) -> Self {
        Self {
            transport,
            api_root,
            timeout,
            last: Mutex::new(None),
        }
    }

    /// Build the wire request for a descriptor, injecting `token` when given
    pub(crate) fn build(&self, descriptor: &RequestDescriptor, token: Option<&str>) -> TransportRequest {
        let mut params = descriptor.params.clone();
        if descriptor.include_token {
            if let Some(token) = token.filter(|t| !t.is_empty()) {
                params.insert("token".to_string(), token.into());
            }
        }

        let mut url = format!("{}/{}", self.api_root, descriptor.path.trim_start_matches('/'));
        let encoded = encode_params(&params);

        let body = if descriptor.method.sends_body() {
            Some(encoded)
        } else {
            if !encoded.is_empty() {
                url.push('?');
                url.push_str(&encoded);
            }
            None
        };

        TransportRequest {
            url,
            method: descriptor.method,
            body,
            timeout: self.timeout,
        }
    }

    /// Send one attempt and record the outcome as the last response
    pub(crate) async fn send(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&str>,
    ) -> Result<ResponseEnvelope> {
        let request = self.build(descriptor, token);
        let raw = self.transport.send(request).await?;

        debug!(
            method = %descriptor.method,
            path = %descriptor.path,
            status = raw.status,
            "API request completed"
        );

        if let Ok(mut last) = self.last.lock() {
            *last = Some(LastResponse {
                status: raw.status,
                body: raw.body.clone(),
            });
        }

        Ok(ResponseEnvelope::from_raw(raw.status, raw.body))
    }

    pub(crate) fn last_response(&self) -> Option<LastResponse> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}
