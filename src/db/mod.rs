//! Data-access layer for the Dremio runner.
//!
//! Provides a trait-based interface over the driver connection that actually
//! executes SQL, so the executor can run against ODBC or an in-memory mock.

mod mock;
#[cfg(feature = "odbc")]
mod odbc;
mod schema;
mod types;

pub use mock::{FailingDataSource, MockDataSource};
#[cfg(feature = "odbc")]
pub use odbc::OdbcDataSource;
pub use schema::{
    group_schema_rows, is_system_schema, SchemaTable, EXCLUDED_SCHEMA_PATTERN, SCHEMA_QUERY,
};
pub use types::{
    determine_type, type_codes, ColumnInfo, QueryResult, RawColumn, RawResult, Row,
    SemanticType, Value,
};

use crate::error::{Result, RunnerError};
use async_trait::async_trait;
use std::time::Duration;

/// Returns true if this build can open real data-access connections.
///
/// The host checks this before instantiating the connector.
pub fn driver_available() -> bool {
    cfg!(feature = "odbc")
}

/// Creates the data source backing real query execution.
#[cfg(feature = "odbc")]
pub fn default_source() -> Result<Box<dyn DataSource>> {
    Ok(Box::new(OdbcDataSource::new()))
}

/// Creates the data source backing real query execution.
#[cfg(not(feature = "odbc"))]
pub fn default_source() -> Result<Box<dyn DataSource>> {
    Err(RunnerError::connection(
        "ODBC support is not available in this build (enable the `odbc` feature)",
    ))
}

/// Outcome of one statement together with how long it ran.
///
/// `elapsed` covers only the statement itself, starting once the connection
/// is open. It is zero when the connection could not be opened.
#[derive(Debug)]
pub struct Execution {
    pub outcome: Result<RawResult>,
    pub elapsed: Duration,
}

impl Execution {
    pub fn new(outcome: Result<RawResult>, elapsed: Duration) -> Self {
        Self { outcome, elapsed }
    }

    /// An execution that never started because connecting failed.
    pub fn not_connected(error: RunnerError) -> Self {
        Self::new(Err(error), Duration::ZERO)
    }
}

/// Trait defining the driver-level execution capability.
///
/// Every call opens its own connection in auto-commit mode and releases the
/// cursor and connection before returning, on success and on failure alike.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Executes one SQL statement and returns its outcome and run time.
    async fn execute(&self, connection_string: &str, sql: &str) -> Execution;
}
