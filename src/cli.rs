//! Command-line argument parsing for the Dremio runner.

use clap::{Parser, Subcommand};
use dremio_runner::config::RunnerConfig;
use dremio_runner::error::Result;
use std::path::PathBuf;

/// Run SQL against Dremio and diagnose failed queries.
#[derive(Parser, Debug)]
#[command(name = "dremio-runner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Dremio host
    #[arg(short = 'H', long, global = true, value_name = "HOST")]
    pub host: Option<String>,

    /// Dremio user
    #[arg(short = 'U', long, global = true, value_name = "USER")]
    pub user: Option<String>,

    /// ODBC port
    #[arg(short = 'p', long, global = true, value_name = "PORT")]
    pub port: Option<String>,

    /// Management API port
    #[arg(long, global = true, value_name = "PORT")]
    pub api_port: Option<u16>,

    /// Use HTTPS for the management API
    #[arg(long, global = true)]
    pub https: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a query and print the result payload as JSON
    Query {
        /// SQL to execute
        sql: String,
    },
    /// Print the catalog schema as JSON
    Schema,
    /// Print the planner diagnostic for a query without executing it
    Diagnose {
        /// SQL to diagnose
        sql: String,
    },
    /// Check connectivity by running a no-op query
    TestConnection,
    /// Print the connector's configuration schema
    ConfigSchema,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use, if any.
    ///
    /// An explicit `--config` is always used; the default path only when it exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => Some(RunnerConfig::default_path()).filter(|p| p.exists()),
        }
    }

    /// Resolves the runner configuration.
    ///
    /// Precedence: CLI arguments, then `DREMIO_*` environment variables,
    /// then the config file.
    pub fn resolve_config(&self) -> Result<RunnerConfig> {
        let mut config = match self.config_path() {
            Some(path) => RunnerConfig::load_from_file(&path)?,
            None => RunnerConfig::default(),
        };

        config.apply_env_overrides();
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut RunnerConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(port) = &self.port {
            config.port = port.clone();
        }
        if let Some(api_port) = self.api_port {
            config.api_port = api_port;
        }
        if self.https {
            config.https = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_parse_query_command() {
        let cli = parse_args(&["dremio-runner", "query", "SELECT 1"]);
        assert_eq!(
            cli.command,
            Command::Query {
                sql: "SELECT 1".to_string()
            }
        );
    }

    #[test]
    fn test_parse_global_args_after_subcommand() {
        let cli = parse_args(&[
            "dremio-runner",
            "schema",
            "-H",
            "dremio.local",
            "-U",
            "alice",
            "--api-port",
            "9443",
            "--https",
        ]);

        assert_eq!(cli.command, Command::Schema);
        assert_eq!(cli.host.as_deref(), Some("dremio.local"));
        assert_eq!(cli.user.as_deref(), Some("alice"));
        assert_eq!(cli.api_port, Some(9443));
        assert!(cli.https);
    }

    #[test]
    fn test_parse_kebab_case_subcommands() {
        let cli = parse_args(&["dremio-runner", "test-connection"]);
        assert_eq!(cli.command, Command::TestConnection);

        let cli = parse_args(&["dremio-runner", "config-schema"]);
        assert_eq!(cli.command, Command::ConfigSchema);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = parse_args(&["dremio-runner", "-H", "cli-host", "-p", "31011", "schema"]);
        let mut config = RunnerConfig::new("file-host", "alice", "pw");

        cli.apply_overrides(&mut config);

        assert_eq!(config.host, "cli-host");
        assert_eq!(config.port, "31011");
        assert_eq!(config.user, "alice");
        assert!(!config.https);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let cli = parse_args(&[
            "dremio-runner",
            "--config",
            "/nonexistent/dremio.toml",
            "schema",
        ]);
        assert!(cli.resolve_config().is_err());
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["dremio-runner"]).is_err());
    }
}
