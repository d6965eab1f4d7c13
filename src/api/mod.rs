//! Dremio management API layer.
//!
//! Provides the authenticated session used to diagnose failed queries, over a
//! trait-based transport so tests can script the server's responses.

pub mod diagnostic;
mod http;
mod mock;
mod session;

pub use http::HttpTransport;
pub use mock::{MockTransport, RecordedRequest};
pub use session::{
    SessionManager, DRIVER_ENV_VAR, HICCUP_MESSAGE, INVALID_TOKEN, MAX_DIAGNOSE_ATTEMPTS,
    UNABLE_TO_LOGIN_MESSAGE,
};

use crate::error::Result;
use async_trait::async_trait;

/// Management API endpoints used by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Exchanges credentials for a session token.
    Login,
    /// Plans SQL as a new untitled dataset without executing it.
    NewQuery,
}

impl Endpoint {
    /// Returns the endpoint path relative to the API root.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "apiv2/login",
            Self::NewQuery => "apiv2/datasets/new_untitled_sql?newVersion=1",
        }
    }
}

/// Status and body of a management API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Trait defining the HTTP capability the session needs.
///
/// Implementations return every HTTP status as a response; only transport
/// failures (unreachable host, timeouts) are errors.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// POSTs `body` as JSON to `url`, with an `authorization` header when given.
    async fn post_json(
        &self,
        url: &str,
        authorization: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<ApiResponse>;
}
