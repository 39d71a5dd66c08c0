//! Test utilities for CLI testing
//!
//! Provides a scripted mock of the Ahrefs API for unit and integration
//! tests. Responses are served in the order they were queued; once the
//! queue is empty the default response is served for every request.

use anyhow::Result;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;

/// A canned API response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl MockResponse {
    /// JSON response with the given status and raw body
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
        }
    }

    /// Add a response header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

impl Default for MockResponse {
    fn default() -> Self {
        Self::json(200, "{}")
    }
}

/// A request received by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Header names are lowercase
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Default)]
struct Script {
    queued: VecDeque<MockResponse>,
    fallback: MockResponse,
    received: Vec<RecordedRequest>,
}

/// Mock server state
#[derive(Debug, Clone, Default)]
pub struct MockServerState {
    script: Arc<Mutex<Script>>,
}

impl MockServerState {
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mock Ahrefs API server bound to an ephemeral local port
#[derive(Debug)]
pub struct MockServer {
    state: MockServerState,
    port: u16,
    url: String,
}

impl MockServer {
    /// Start the mock server in the background
    pub async fn start() -> Result<Self> {
        let state = MockServerState::default();
        let app = Router::new()
            .fallback(mock_handler)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock server error: {}", e);
            }
        });

        Ok(Self {
            state,
            port,
            url: format!("http://127.0.0.1:{}", port),
        })
    }

    /// Base URL to point the client at
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Queue a response for the next unanswered request
    pub fn enqueue(&self, response: MockResponse) {
        self.state.lock().queued.push_back(response);
    }

    /// Response served once the queue is exhausted
    pub fn set_default(&self, response: MockResponse) {
        self.state.lock().fallback = response;
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().received.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().received.len()
    }
}

async fn mock_handler(
    State(state): State<MockServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let reply = {
        let mut script = state.lock();
        script.received.push(RecordedRequest {
            method: method.to_string(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            headers: headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        value.to_str().unwrap_or_default().to_string(),
                    )
                })
                .collect(),
        });
        let fallback = script.fallback.clone();
        script.queued.pop_front().unwrap_or(fallback)
    };

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut reply_headers = HeaderMap::new();
    for (name, value) in &reply.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            reply_headers.append(name, value);
        }
    }

    (status, reply_headers, reply.body).into_response()
}
