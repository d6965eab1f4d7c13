//! Mock data sources for testing.
//!
//! Provides scripted in-memory execution so the executor can be tested
//! without an ODBC driver.

use super::{DataSource, Execution, RawResult};
use crate::error::RunnerError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Scripted outcome for queries matching a pattern.
#[derive(Debug, Clone)]
enum Outcome {
    Rows(RawResult),
    Fail(String),
}

/// A mock data source that returns predefined results.
///
/// Queries are matched by case-insensitive substring against the registered
/// patterns, first match wins. Unmatched queries return an empty result.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    outcomes: Vec<(String, Outcome)>,
    connect_latency: Duration,
    latency: Duration,
    executed: Arc<Mutex<Vec<String>>>,
}

impl MockDataSource {
    /// Creates a new mock data source with no scripted outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `result` for queries containing `pattern`.
    pub fn with_result(mut self, pattern: impl Into<String>, result: RawResult) -> Self {
        self.outcomes.push((pattern.into(), Outcome::Rows(result)));
        self
    }

    /// Fails queries containing `pattern` with the given driver message.
    pub fn with_failure(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.outcomes.push((pattern.into(), Outcome::Fail(message.into())));
        self
    }

    /// Delays opening the connection by `latency`.
    pub fn with_connect_latency(mut self, latency: Duration) -> Self {
        self.connect_latency = latency;
        self
    }

    /// Delays every statement by `latency` before producing its outcome.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns the SQL of every execution so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn execute(&self, _connection_string: &str, sql: &str) -> Execution {
        if let Ok(mut log) = self.executed.lock() {
            log.push(sql.to_string());
        }

        if !self.connect_latency.is_zero() {
            tokio::time::sleep(self.connect_latency).await;
        }

        let start = Instant::now();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let sql_lower = sql.to_lowercase();
        let outcome = self
            .outcomes
            .iter()
            .find(|(pattern, _)| sql_lower.contains(&pattern.to_lowercase()))
            .map(|(_, outcome)| outcome.clone());

        let outcome = match outcome {
            Some(Outcome::Rows(result)) => Ok(result),
            Some(Outcome::Fail(message)) => Err(RunnerError::query(message)),
            None => Ok(RawResult::default()),
        };
        Execution::new(outcome, start.elapsed())
    }
}

/// A data source whose every execution fails.
#[derive(Debug, Clone)]
pub struct FailingDataSource {
    message: String,
}

impl FailingDataSource {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DataSource for FailingDataSource {
    async fn execute(&self, _connection_string: &str, _sql: &str) -> Execution {
        Execution::new(Err(RunnerError::query(self.message.clone())), Duration::ZERO)
    }
}
