//! Configuration management for the Dremio runner.
//!
//! Handles loading the connector configuration from TOML files and
//! environment variables, and exposes the JSON schema the host uses to
//! render its configuration form.

use crate::error::{RunnerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default ODBC driver display name.
pub const DEFAULT_DRIVER: &str = "{Dremio ODBC Driver 64-bit}";

/// Default ODBC port.
pub const DEFAULT_ODBC_PORT: &str = "31010";

/// Default management API port.
pub const DEFAULT_API_PORT: u16 = 9047;

/// Connector configuration supplied by the host.
#[derive(Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Dremio coordinator host.
    #[serde(default)]
    pub host: String,

    /// Dremio user.
    #[serde(default)]
    pub user: String,

    /// Dremio password. Never logged.
    #[serde(default)]
    pub password: String,

    /// ODBC port, kept as text the way the host stores it.
    #[serde(default = "default_port")]
    pub port: String,

    /// ODBC driver display name.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Management API port.
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Use HTTPS for the management API.
    #[serde(default)]
    pub https: bool,
}

fn default_port() -> String {
    DEFAULT_ODBC_PORT.to_string()
}

fn default_driver() -> String {
    DEFAULT_DRIVER.to_string()
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            password: String::new(),
            port: default_port(),
            driver: default_driver(),
            api_port: default_api_port(),
            https: false,
        }
    }
}

impl fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"********")
            .field("port", &self.port)
            .field("driver", &self.driver)
            .field("api_port", &self.api_port)
            .field("https", &self.https)
            .finish()
    }
}

impl RunnerConfig {
    /// Creates a config with the required fields and defaults for the rest.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dremio-runner")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RunnerError::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            RunnerError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies `DREMIO_*` environment variables over the loaded values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("DREMIO_HOST") {
            self.host = host;
        }
        if let Ok(user) = std::env::var("DREMIO_USER") {
            self.user = user;
        }
        if let Ok(password) = std::env::var("DREMIO_PASSWORD") {
            self.password = password;
        }
        if let Ok(port) = std::env::var("DREMIO_PORT") {
            self.port = port;
        }
        if let Ok(api_port) = std::env::var("DREMIO_API_PORT") {
            if let Ok(api_port) = api_port.parse() {
                self.api_port = api_port;
            }
        }
        if let Ok(https) = std::env::var("DREMIO_HTTPS") {
            self.https = matches!(https.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    /// Checks that every required field is present and well-formed.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("host", &self.host),
            ("user", &self.user),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(RunnerError::config(format!("missing field '{field}'")));
            }
        }

        if self.port.parse::<u16>().is_err() {
            return Err(RunnerError::config(format!(
                "invalid port '{}': expected a number",
                self.port
            )));
        }

        Ok(())
    }

    /// Returns a display-safe string (no password) for logs.
    pub fn display_string(&self) -> String {
        format!("{} @ {}:{}", self.user, self.host, self.port)
    }
}

/// Returns the JSON schema the host uses to render the configuration form.
pub fn configuration_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "driver": {
                "type": "string",
                "default": DEFAULT_DRIVER
            },
            "host": {
                "type": "string"
            },
            "port": {
                "type": "string",
                "default": DEFAULT_ODBC_PORT
            },
            "user": {
                "type": "string"
            },
            "password": {
                "type": "string"
            }
        },
        "order": ["driver", "host", "port", "user", "password"],
        "required": ["user", "password", "host", "port", "driver"],
        "secret": ["password"]
    })
}
