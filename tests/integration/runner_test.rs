//! Query execution integration tests.
//!
//! Tests query execution, result typing and schema listing through the
//! runner's public API.

use std::time::Duration;

use dremio_runner::api::MockTransport;
use dremio_runner::config::RunnerConfig;
use dremio_runner::db::{MockDataSource, RawColumn, RawResult, SchemaTable, Value};
use dremio_runner::runner::TIMEOUT_MESSAGE;
use dremio_runner::{DremioRunner, RunnerError};
use pretty_assertions::assert_eq;

/// Helper to create a runner over scripted collaborators.
async fn get_test_runner(transport: &MockTransport, source: &MockDataSource) -> DremioRunner {
    DremioRunner::new(
        RunnerConfig::new("dremio.local", "analyst", "pw"),
        Box::new(transport.clone()),
        Box::new(source.clone()),
    )
    .await
    .unwrap()
}

fn events_result() -> RawResult {
    RawResult {
        columns: vec![
            RawColumn::new("id", 0, 0),
            RawColumn::new("amount", 0, 2),
            RawColumn::new("kind", 2, 0),
            RawColumn::new("day", 3, 0),
            RawColumn::new("at", 4, 0),
            RawColumn::new("ok", 13, 0),
            RawColumn::new("blob", 99, 0),
        ],
        rows: vec![
            vec![
                Value::Int(1),
                Value::Float(12.5),
                Value::from("click"),
                Value::from("2024-03-01"),
                Value::from("2024-03-01 10:00:00"),
                Value::Bool(true),
                Value::Null,
            ],
            vec![
                Value::Int(2),
                Value::Null,
                Value::from("view"),
                Value::Null,
                Value::Null,
                Value::Bool(false),
                Value::from("x"),
            ],
        ],
    }
}

#[tokio::test]
async fn test_result_payload_types_every_column() {
    let transport = MockTransport::new().with_login_token("t");
    let source = MockDataSource::new().with_result("from events", events_result());
    let mut runner = get_test_runner(&transport, &source).await;

    let payload = runner
        .run_query_json("SELECT * FROM events")
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&payload).unwrap();

    assert_eq!(
        json["columns"],
        serde_json::json!([
            {"name": "id", "type": "integer"},
            {"name": "amount", "type": "float"},
            {"name": "kind", "type": "string"},
            {"name": "day", "type": "date"},
            {"name": "at", "type": "datetime"},
            {"name": "ok", "type": "boolean"},
            {"name": "blob", "type": null}
        ])
    );
    assert_eq!(json["rows"][0]["amount"], serde_json::json!(12.5));
    assert_eq!(json["rows"][1]["ok"], serde_json::json!(false));
}

#[tokio::test]
async fn test_every_row_has_one_key_per_column() {
    let transport = MockTransport::new().with_login_token("t");
    let source = MockDataSource::new().with_result("from events", events_result());
    let mut runner = get_test_runner(&transport, &source).await;

    let result = runner.run_query("SELECT * FROM events").await.unwrap();

    for row in &result.rows {
        assert_eq!(row.len(), result.columns.len());
        let keys: Vec<&String> = row.keys().collect();
        let names: Vec<&String> = result.columns.iter().map(|c| &c.name).collect();
        assert_eq!(keys, names);
    }
}

#[tokio::test]
async fn test_each_query_opens_its_own_execution() {
    let transport = MockTransport::new().with_login_token("t");
    let source = MockDataSource::new();
    let mut runner = get_test_runner(&transport, &source).await;

    runner.run_query("SELECT 1").await.unwrap();
    runner.run_query("SELECT 2").await.unwrap();

    assert_eq!(source.executed(), vec!["SELECT 1", "SELECT 2"]);
    // Successful queries never touch the planner.
    assert_eq!(transport.request_count("new_untitled_sql"), 0);
}

#[tokio::test]
async fn test_failed_query_surfaces_diagnostic() {
    let transport = MockTransport::new().with_login_token("t").with_response(
        "new_untitled_sql",
        400,
        serde_json::json!({
            "code": "VALIDATION_ERROR",
            "errorMessage": "Object 'nope' not found",
            "details": {"errors": [
                {"message": "Object 'nope' not found", "range": {"startLine": 1, "startColumn": 15}}
            ]}
        })
        .to_string(),
    );
    let source = MockDataSource::new().with_failure("nope", "[Dremio][Connector] (1040) error");
    let mut runner = get_test_runner(&transport, &source).await;

    let err = runner.run_query("SELECT * FROM nope").await.unwrap_err();

    match err {
        RunnerError::Query(message) => {
            assert!(message.starts_with("VALIDATION_ERROR: Object 'nope' not found"));
            assert!(message.ends_with("at Line 1 and column 15"));
        }
        other => panic!("Expected query error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_failure_reports_timeout() {
    let transport = MockTransport::new().with_login_token("t");
    let source = MockDataSource::new()
        .with_failure("huge", "connection reset")
        .with_latency(Duration::from_millis(1500));
    let mut runner = get_test_runner(&transport, &source).await;

    let err = runner.run_query("SELECT * FROM huge").await.unwrap_err();

    assert_eq!(err.to_string(), TIMEOUT_MESSAGE);
    assert_eq!(transport.request_count("new_untitled_sql"), 0);
}

#[tokio::test]
async fn test_schema_listing_skips_system_schemas() {
    let columns = vec![
        RawColumn::new("TABLE_CATALOG", 2, 0),
        RawColumn::new("TABLE_SCHEMA", 2, 0),
        RawColumn::new("TABLE_NAME", 2, 0),
        RawColumn::new("COLUMN_NAME", 2, 0),
    ];
    let rows = [
        ("lake.sales", "orders", "id"),
        ("sys", "options", "name"),
        ("lake.sales", "orders", "total"),
        ("lake.ops", "runs", "started_at"),
    ]
    .into_iter()
    .map(|(s, t, c)| {
        vec![
            Value::from("DREMIO"),
            Value::from(s),
            Value::from(t),
            Value::from(c),
        ]
    })
    .collect();
    let transport = MockTransport::new().with_login_token("t");
    let source =
        MockDataSource::new().with_result("INFORMATION_SCHEMA", RawResult { columns, rows });
    let mut runner = get_test_runner(&transport, &source).await;

    let tables = runner.get_schema().await.unwrap();

    assert_eq!(
        tables,
        vec![
            SchemaTable {
                name: "lake.sales.orders".to_string(),
                columns: vec!["id".to_string(), "total".to_string()],
            },
            SchemaTable {
                name: "lake.ops.runs".to_string(),
                columns: vec!["started_at".to_string()],
            },
        ]
    );
}
