//! Shared types for the e2e test framework

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A mock response the upstream will serve for the next request to one model
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: String,
}

impl MockResponse {
    /// Create a 200 JSON response
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: "application/json".to_string(),
        }
    }

    /// Create an error response with a JSON body
    pub fn error(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "application/json".to_string(),
        }
    }

    /// Create a response whose body is not JSON
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain".to_string(),
        }
    }
}

/// Shared state for the mock upstream server
#[derive(Debug, Default)]
pub struct UpstreamState {
    /// Per-model queues - tests push responses, upstream pops and serves them
    pub response_queues: HashMap<String, VecDeque<MockResponse>>,
    /// All requests received by the upstream, in arrival order
    pub received_requests: Vec<ReceivedRequest>,
}

/// A request received by the mock upstream
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    /// Model from the path (raw generation) or the body (chat completions)
    pub model: String,
    /// Status the mock answered with
    pub status: u16,
    pub path: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

pub type SharedUpstreamState = Arc<Mutex<UpstreamState>>;

/// Result of a proxy request
#[derive(Debug)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    /// Parsed JSON body; `Null` when empty, `String` when not JSON
    pub body: serde_json::Value,
}

impl ProxyResponse {
    /// Get a nested field using dot notation (e.g. "0.generated_text")
    pub fn get(&self, path: &str) -> Option<&serde_json::Value> {
        let mut current = &self.body;
        for part in path.split('.') {
            current = if let Ok(idx) = part.parse::<usize>() {
                current.as_array()?.get(idx)?
            } else {
                current.as_object()?.get(part)?
            };
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// Result of a single scenario
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
    /// Upstream calls the scenario caused, in order
    pub upstream_calls: Vec<ReceivedRequest>,
}
