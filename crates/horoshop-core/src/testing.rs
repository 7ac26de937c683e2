//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{RawResponse, Result, Transport, TransportRequest};

/// Answers requests from per-path queues. The last queued response for a
/// path is repeated once the queue is drained to one entry.
#[derive(Default)]
pub(crate) struct StubTransport {
    responses: Mutex<HashMap<String, VecDeque<RawResponse>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, path: &str, status: u16, body: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(RawResponse::new(status, body));
        self
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| path_of(&r.url) == path)
            .count()
    }
}

fn path_of(url: &str) -> &str {
    let after_root = url.split_once("/api/").map(|(_, rest)| rest).unwrap_or(url);
    after_root.split('?').next().unwrap_or(after_root)
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: TransportRequest) -> Result<RawResponse> {
        let path = path_of(&request.url).to_string();
        self.requests.lock().unwrap().push(request);

        let mut responses = self.responses.lock().unwrap();
        let response = match responses.get_mut(&path) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| RawResponse::new(404, format!("no stub for {}", path))))
    }
}
