//! Mock management API transport for testing.
//!
//! Serves scripted responses per endpoint and records every request.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::api::{ApiResponse, ApiTransport};
use crate::error::Result;

/// A request seen by the mock transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Debug, Default)]
struct MockState {
    /// (url pattern, queued responses). The last response of a queue repeats.
    routes: Vec<(String, VecDeque<ApiResponse>)>,
    requests: Vec<RecordedRequest>,
}

/// Mock transport returning canned responses by URL pattern.
///
/// Clones share state, so a test can keep a handle after moving the
/// transport into a session. Unmatched URLs get a 404.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates a mock transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for URLs containing `pattern`.
    pub fn with_response(self, pattern: &str, status: u16, body: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            let response = ApiResponse::new(status, body);
            match state.routes.iter().position(|(p, _)| p.as_str() == pattern) {
                Some(index) => state.routes[index].1.push_back(response),
                None => state
                    .routes
                    .push((pattern.to_string(), VecDeque::from([response]))),
            }
        }
        self
    }

    /// Answers logins with the given token.
    pub fn with_login_token(self, token: &str) -> Self {
        self.with_response(
            "apiv2/login",
            200,
            serde_json::json!({ "token": token }).to_string(),
        )
    }

    /// Returns every request so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .map(|state| state.requests.clone())
            .unwrap_or_default()
    }

    /// Returns the number of requests whose URL contains `pattern`.
    pub fn request_count(&self, pattern: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.contains(pattern))
            .count()
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn post_json(
        &self,
        url: &str,
        authorization: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<ApiResponse> {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        state.requests.push(RecordedRequest {
            url: url.to_string(),
            authorization: authorization.map(str::to_string),
            body: body.clone(),
        });

        let response = state
            .routes
            .iter_mut()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .and_then(|(_, queue)| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            });

        Ok(response.unwrap_or_else(|| ApiResponse::new(404, "Not Found")))
    }
}
