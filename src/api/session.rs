//! Authenticated management API session.
//!
//! `SessionManager` logs in, keeps the session token, builds the ODBC
//! connection string and turns failed SQL into a planner diagnostic.

use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::diagnostic::{render_planner_error, strip_leading_comment};
use crate::api::{ApiTransport, Endpoint};
use crate::config::RunnerConfig;
use crate::error::{RunnerError, Result};

/// Token installed when the login response carries none.
pub const INVALID_TOKEN: &str = "invalidtoken";

/// Prefix of the authorization header value.
const AUTHORIZATION_PREFIX: &str = "_dremio";

/// Environment variable overriding the ODBC driver name.
pub const DRIVER_ENV_VAR: &str = "DREMIO_DRIVER";

/// Planner requests made by one diagnosis before giving up on 401s.
pub const MAX_DIAGNOSE_ATTEMPTS: u32 = 3;

/// Returned when planning succeeds although execution failed.
pub const HICCUP_MESSAGE: &str = "Dremio had a slight hiccup, please re-run your query";

/// Returned when re-login keeps being rejected.
pub const UNABLE_TO_LOGIN_MESSAGE: &str = "Unable to Login to dremio";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Owns one authenticated management API session.
pub struct SessionManager {
    config: RunnerConfig,
    transport: Box<dyn ApiTransport>,
    api_url: String,
    base_url: Url,
    token: Option<String>,
}

impl SessionManager {
    /// Creates an unauthenticated session.
    pub fn new(config: RunnerConfig, transport: Box<dyn ApiTransport>) -> Result<Self> {
        let scheme = if config.https { "https" } else { "http" };
        let api_url = format!("{}://{}:{}", scheme, config.host, config.api_port);
        let base_url = Url::parse(&api_url)
            .map_err(|e| RunnerError::config(format!("Invalid API address '{api_url}': {e}")))?;

        Ok(Self {
            config,
            transport,
            api_url,
            base_url,
            token: None,
        })
    }

    /// Creates a session and logs in.
    pub async fn connect(config: RunnerConfig, transport: Box<dyn ApiTransport>) -> Result<Self> {
        let mut session = Self::new(config, transport)?;
        session.login().await;
        Ok(session)
    }

    /// Returns the API root, `{scheme}://{host}:{api_port}`.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Returns the absolute URL of an endpoint.
    pub fn url_for(&self, endpoint: Endpoint) -> String {
        match self.base_url.join(endpoint.path()) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}/{}", self.api_url, endpoint.path()),
        }
    }

    /// Returns true once a token has been installed.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Returns the current session token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the authorization header value for the current token.
    pub fn authorization(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|token| format!("{AUTHORIZATION_PREFIX}{token}"))
    }

    /// Logs in and installs the returned token.
    ///
    /// Never fails: a rejected or unreadable login installs
    /// [`INVALID_TOKEN`] and later requests are answered with 401.
    pub async fn login(&mut self) {
        let url = self.url_for(Endpoint::Login);
        let body = serde_json::json!({
            "userName": self.config.user,
            "password": self.config.password,
        });

        let token = match self.transport.post_json(&url, None, &body).await {
            Ok(response) => serde_json::from_str::<LoginResponse>(&response.body)
                .ok()
                .and_then(|login| login.token),
            Err(e) => {
                warn!(error = %e, "Login request failed");
                None
            }
        };

        if token.is_none() {
            warn!(user = %self.config.user, "Login returned no token");
        } else {
            info!(user = %self.config.user, "Logged in to Dremio");
        }

        self.token = Some(token.unwrap_or_else(|| INVALID_TOKEN.to_string()));
    }

    /// Builds the ODBC connection string.
    ///
    /// The driver name comes from `DREMIO_DRIVER` when set, else from config.
    pub fn connection_string(&self) -> String {
        self.connection_string_with(std::env::var(DRIVER_ENV_VAR).ok())
    }

    /// Builds the ODBC connection string with an explicit driver override.
    ///
    /// An override is a bare driver name and gets wrapped in braces; the
    /// configured driver is used as written.
    pub fn connection_string_with(&self, driver_override: Option<String>) -> String {
        let driver = match driver_override {
            Some(driver) => format!("{{{driver}}}"),
            None => self.config.driver.clone(),
        };

        format!(
            "Driver={};ConnectionType=Direct;HOST={};PORT={};AuthenticationType=Plain;UID={};PWD={}",
            driver, self.config.host, self.config.port, self.config.user, self.config.password
        )
    }

    /// Diagnoses a failed query through the planning endpoint.
    pub async fn diagnose(&mut self, sql: &str) -> String {
        self.diagnose_with_attempts(sql, 0, MAX_DIAGNOSE_ATTEMPTS).await
    }

    /// Diagnoses a failed query, starting at `attempt` of `max_attempts`.
    ///
    /// Always produces a message. Each 401 triggers one re-login; the
    /// request is retried until `max_attempts` requests have been rejected.
    pub async fn diagnose_with_attempts(
        &mut self,
        sql: &str,
        attempt: u32,
        max_attempts: u32,
    ) -> String {
        let url = self.url_for(Endpoint::NewQuery);
        let body = serde_json::json!({ "sql": strip_leading_comment(sql) });
        let mut attempt = attempt;

        loop {
            let authorization = self.authorization();
            let response = match self
                .transport
                .post_json(&url, authorization.as_deref(), &body)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "Planner request failed");
                    return e.to_string();
                }
            };

            debug!(status = response.status, attempt, "Planner responded");

            match response.status {
                400 => return render_planner_error(&response.body),
                200 => return HICCUP_MESSAGE.to_string(),
                401 => {
                    warn!(attempt, "Session rejected, logging in again");
                    self.login().await;
                    attempt += 1;
                    if attempt >= max_attempts {
                        return UNABLE_TO_LOGIN_MESSAGE.to_string();
                    }
                }
                status => {
                    warn!(status, "Unexpected planner status");
                    return response.body;
                }
            }
        }
    }
}
