//! ODBC data source implementation.
//!
//! Executes SQL through the system ODBC driver manager using `odbc-api`.
//! Driver calls are blocking, so each execution runs on tokio's blocking pool.

use crate::db::{
    determine_type, type_codes, DataSource, Execution, RawColumn, RawResult, SemanticType, Value,
};
use crate::error::{Result, RunnerError};
use async_trait::async_trait;
use odbc_api::buffers::TextRowSet;
use odbc_api::{Connection, ConnectionOptions, Cursor, DataType, Environment, ResultSetMetadata};
use std::time::Instant;
use tracing::debug;

/// Rows fetched per round trip.
const BATCH_SIZE: usize = 1000;

/// Upper bound for a single text cell, in bytes. Longer cells fail the
/// query instead of being truncated.
const MAX_TEXT_LEN: usize = 65_536;

/// Data source backed by an ODBC driver.
#[derive(Debug, Clone, Default)]
pub struct OdbcDataSource;

impl OdbcDataSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DataSource for OdbcDataSource {
    async fn execute(&self, connection_string: &str, sql: &str) -> Execution {
        let connection_string = connection_string.to_string();
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || execute_blocking(&connection_string, &sql))
            .await
            .unwrap_or_else(|e| {
                Execution::not_connected(RunnerError::internal(format!("ODBC worker failed: {e}")))
            })
    }
}

/// Opens a connection, runs `sql` and drains the cursor.
///
/// The environment, connection and cursor are all scoped to this call. The
/// clock starts once the connection is open.
fn execute_blocking(connection_string: &str, sql: &str) -> Execution {
    let env = match Environment::new() {
        Ok(env) => env,
        Err(e) => {
            let message = format!("Failed to initialize ODBC: {e}");
            return Execution::not_connected(RunnerError::connection(message));
        }
    };
    let connection = match open_connection(&env, connection_string) {
        Ok(connection) => connection,
        Err(e) => return Execution::not_connected(e),
    };

    let start = Instant::now();
    let outcome = run_statement(&connection, sql);
    Execution::new(outcome, start.elapsed())
}

fn open_connection<'env>(
    env: &'env Environment,
    connection_string: &str,
) -> Result<Connection<'env>> {
    debug!("Opening ODBC connection");
    let connection = env
        .connect_with_connection_string(connection_string, ConnectionOptions::default())
        .map_err(|e| RunnerError::connection(format!("Failed to connect: {e}")))?;
    connection
        .set_autocommit(true)
        .map_err(|e| RunnerError::connection(format!("Failed to enable autocommit: {e}")))?;
    Ok(connection)
}

fn run_statement(connection: &Connection<'_>, sql: &str) -> Result<RawResult> {
    let Some(mut cursor) = connection.execute(sql, ()).map_err(query_error)? else {
        return Ok(RawResult::default());
    };

    let num_cols = cursor.num_result_cols().map_err(query_error)?;
    let mut columns = Vec::with_capacity(num_cols.max(0) as usize);
    for index in 1..=num_cols.max(0) as u16 {
        let name = cursor.col_name(index).map_err(query_error)?;
        let (type_code, scale) = type_code_of(cursor.col_data_type(index).map_err(query_error)?);
        columns.push(RawColumn::new(name, type_code, scale));
    }

    let semantic: Vec<Option<SemanticType>> = columns
        .iter()
        .map(|c| determine_type(c.type_code, c.scale))
        .collect();

    let buffer =
        TextRowSet::for_cursor(BATCH_SIZE, &mut cursor, Some(MAX_TEXT_LEN)).map_err(query_error)?;
    let mut row_set_cursor = cursor.bind_buffer(buffer).map_err(query_error)?;

    let mut rows = Vec::new();
    while let Some(batch) = row_set_cursor
        .fetch_with_truncation_check(true)
        .map_err(query_error)?
    {
        for row_index in 0..batch.num_rows() {
            let mut row = Vec::with_capacity(batch.num_cols());
            for col_index in 0..batch.num_cols() {
                let column = columns.get(col_index).map_or("?", |c| c.name.as_str());
                let text = decode_cell(column, batch.at(col_index, row_index))?;
                row.push(parse_text(text, semantic.get(col_index).copied().flatten()));
            }
            rows.push(row);
        }
    }

    Ok(RawResult { columns, rows })
}

/// Decodes a text cell. NULL stays `None`; invalid UTF-8 fails the query.
fn decode_cell<'a>(column: &str, bytes: Option<&'a [u8]>) -> Result<Option<&'a str>> {
    bytes
        .map(std::str::from_utf8)
        .transpose()
        .map_err(|e| RunnerError::query(format!("Column '{column}' is not valid UTF-8: {e}")))
}

fn query_error(e: odbc_api::Error) -> RunnerError {
    RunnerError::query(e.to_string())
}

/// Maps an ODBC data type onto the driver type-code table.
///
/// Exact numerics keep their scale so scaled decimals promote to float.
fn type_code_of(data_type: DataType) -> (i32, i16) {
    match data_type {
        DataType::Integer | DataType::SmallInt | DataType::TinyInt | DataType::BigInt => {
            (type_codes::INTEGER, 0)
        }
        DataType::Decimal { scale, .. } | DataType::Numeric { scale, .. } => {
            (type_codes::INTEGER, scale)
        }
        DataType::Float { .. } | DataType::Real | DataType::Double => (type_codes::FLOAT, 0),
        DataType::Char { .. }
        | DataType::WChar { .. }
        | DataType::Varchar { .. }
        | DataType::WVarchar { .. } => (type_codes::STRING, 0),
        DataType::LongVarchar { .. } => (type_codes::LONG_STRING, 0),
        DataType::Date => (type_codes::DATE, 0),
        DataType::Timestamp { .. } => (type_codes::DATETIME, 0),
        DataType::Time { .. } => (type_codes::TIME, 0),
        DataType::Bit => (type_codes::BOOLEAN, 0),
        _ => (-1, 0),
    }
}

/// Converts a text cell into a value according to its semantic type.
fn parse_text(text: Option<&str>, semantic: Option<SemanticType>) -> Value {
    let Some(text) = text else {
        return Value::Null;
    };

    match semantic {
        Some(SemanticType::Integer) => text
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::from(text)),
        Some(SemanticType::Float) => text
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::from(text)),
        Some(SemanticType::Boolean) => match text {
            "1" | "true" | "TRUE" => Value::Bool(true),
            "0" | "false" | "FALSE" => Value::Bool(false),
            other => Value::from(other),
        },
        _ => Value::from(text),
    }
}
