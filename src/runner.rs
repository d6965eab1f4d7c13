//! Dremio query runner.
//!
//! `DremioRunner` executes one SQL statement per call over a fresh
//! data-access connection and turns failures into readable diagnostics.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{ApiTransport, HttpTransport, SessionManager};
use crate::config::{self, RunnerConfig};
use crate::db::{
    self, group_schema_rows, DataSource, Execution, QueryResult, SchemaTable, SCHEMA_QUERY,
};
use crate::error::{RunnerError, Result};

/// Runner type name registered with the host.
pub const RUNNER_TYPE: &str = "dremio_odbc";

/// Query used to check that the connection works.
pub const NOOP_QUERY: &str = "SELECT 1";

/// Reported when a query fails after running longer than [`DIAGNOSE_WINDOW`].
pub const TIMEOUT_MESSAGE: &str =
    "Dremio query timeout, ensure that your query is optimized and run again";

/// Reported when listing the catalog fails.
pub const SCHEMA_ERROR_MESSAGE: &str = "Failed getting schema.";

/// Failures slower than this are reported as timeouts instead of being
/// re-submitted to the planner.
const DIAGNOSE_WINDOW: Duration = Duration::from_secs(1);

/// Executes queries against Dremio for the host.
///
/// Holds one management API session for its whole lifetime. Calls take
/// `&mut self`, so concurrent queries need one runner each.
pub struct DremioRunner {
    session: SessionManager,
    source: Box<dyn DataSource>,
}

impl DremioRunner {
    /// Creates a runner over the given transport and data source, logging in.
    pub async fn new(
        config: RunnerConfig,
        transport: Box<dyn ApiTransport>,
        source: Box<dyn DataSource>,
    ) -> Result<Self> {
        config.validate()?;
        info!("Connecting runner to {}", config.display_string());

        let session = SessionManager::connect(config, transport).await?;
        Ok(Self { session, source })
    }

    /// Creates a runner using HTTP for the management API and ODBC for data.
    pub async fn from_config(config: RunnerConfig) -> Result<Self> {
        let transport = HttpTransport::new()?;
        let source = db::default_source()?;
        Self::new(config, Box::new(transport), source).await
    }

    /// Returns the runner type name.
    pub fn runner_type() -> &'static str {
        RUNNER_TYPE
    }

    /// Returns true if this build can execute queries.
    pub fn enabled() -> bool {
        db::driver_available()
    }

    /// Returns the host-facing configuration schema.
    pub fn configuration_schema() -> serde_json::Value {
        config::configuration_schema()
    }

    /// Runs one query and returns its typed result.
    ///
    /// On failure, a query that failed within [`DIAGNOSE_WINDOW`] is diagnosed
    /// through the planner; a slower one is reported as a timeout. Time spent
    /// opening the connection does not count toward the window.
    pub async fn run_query(&mut self, sql: &str) -> Result<QueryResult> {
        let connection_string = self.session.connection_string();

        let Execution { outcome, elapsed } = self.source.execute(&connection_string, sql).await;

        match outcome {
            Ok(raw) => {
                let result = QueryResult::from_raw(raw);
                info!(
                    rows = result.rows.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Query completed"
                );
                Ok(result)
            }
            Err(e @ RunnerError::Connection(_)) => Err(e),
            Err(e) => {
                debug!(error = %e, ?elapsed, "Query failed");

                if elapsed > DIAGNOSE_WINDOW {
                    warn!(?elapsed, "Slow query failure, skipping diagnosis");
                    return Err(RunnerError::timeout(TIMEOUT_MESSAGE));
                }

                Err(RunnerError::query(self.session.diagnose(sql).await))
            }
        }
    }

    /// Runs one query and returns the serialized result payload.
    pub async fn run_query_json(&mut self, sql: &str) -> Result<String> {
        let result = self.run_query(sql).await?;
        Ok(result.to_json()?)
    }

    /// Lists user-visible tables and their columns.
    pub async fn get_schema(&mut self) -> Result<Vec<SchemaTable>> {
        let result = self.run_query(SCHEMA_QUERY).await.map_err(|e| {
            warn!(error = %e, "Schema query failed");
            RunnerError::schema(SCHEMA_ERROR_MESSAGE)
        })?;

        Ok(group_schema_rows(&result.rows))
    }

    /// Checks connectivity by running [`NOOP_QUERY`].
    pub async fn test_connection(&mut self) -> Result<()> {
        self.run_query(NOOP_QUERY).await.map(|_| ())
    }
}
