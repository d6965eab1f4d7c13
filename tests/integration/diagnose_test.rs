//! Failure diagnosis integration tests.
//!
//! Drives the session through the public API against a scripted server.

use dremio_runner::api::{
    MockTransport, SessionManager, HICCUP_MESSAGE, MAX_DIAGNOSE_ATTEMPTS, UNABLE_TO_LOGIN_MESSAGE,
};
use dremio_runner::config::RunnerConfig;
use pretty_assertions::assert_eq;

const PLANNER: &str = "new_untitled_sql";
const LOGIN: &str = "apiv2/login";

async fn connect(transport: &MockTransport) -> SessionManager {
    SessionManager::connect(
        RunnerConfig::new("dremio.local", "analyst", "pw"),
        Box::new(transport.clone()),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_parse_error_renders_line_and_column() {
    let body = serde_json::json!({
        "code": "INVALID_QUERY",
        "errorMessage": "Failure parsing the query.",
        "details": {
            "errors": [{
                "message": "Failure parsing the query.\norg.apache.calcite.sql.parser.SqlParseException: Encountered \"FORM\" at line 1, column 10.\ncom.dremio.exec.planner.sql.parser.impl.ParserImpl",
                "range": {"startLine": 1, "startColumn": 10, "endLine": 1, "endColumn": 13}
            }]
        }
    });
    let transport = MockTransport::new()
        .with_login_token("t1")
        .with_response(PLANNER, 400, body.to_string());
    let mut session = connect(&transport).await;

    let message = session
        .diagnose("/* dashboard 7 */ SELECT * FORM events")
        .await;

    assert_eq!(
        message,
        "INVALID_QUERY: Failure parsing the query. \n\nDETAILS\n\n\
         Error Failure parsing the query.  Encountered \"FORM\" at line 1, column 10.\n \
         at Line 1 and column 10"
    );
}

#[tokio::test]
async fn test_two_errors_keep_report_order() {
    let body = serde_json::json!({
        "code": "VALIDATION_ERROR",
        "errorMessage": "Query is not valid",
        "details": {
            "errors": [
                {"message": "Column 'b' not found", "range": {"startLine": 2, "startColumn": 8}},
                {"message": "Table 't' not found", "range": {"startLine": 3, "startColumn": 6}}
            ]
        }
    });
    let transport = MockTransport::new()
        .with_login_token("t1")
        .with_response(PLANNER, 400, body.to_string());
    let mut session = connect(&transport).await;

    let message = session.diagnose("SELECT a,\n  b\nFROM t").await;

    let (header, details) = message.split_once("\n\nDETAILS\n\n").unwrap();
    assert_eq!(header, "VALIDATION_ERROR: Query is not valid ");
    let lines: Vec<&str> = details.split('\n').collect();
    assert_eq!(
        lines,
        vec![
            "Error Column 'b' not found Column 'b' not found at Line 2 and column 8",
            "Error Table 't' not found Table 't' not found at Line 3 and column 6",
        ]
    );
}

#[tokio::test]
async fn test_expired_session_is_refreshed_transparently() {
    let transport = MockTransport::new()
        .with_login_token("stale")
        .with_login_token("fresh")
        .with_response(PLANNER, 401, r#"{"errorMessage": "expired"}"#)
        .with_response(PLANNER, 200, "{}");
    let mut session = connect(&transport).await;

    assert_eq!(session.diagnose("SELECT 1").await, HICCUP_MESSAGE);

    let planner_auth: Vec<Option<String>> = transport
        .requests()
        .into_iter()
        .filter(|r| r.url.contains(PLANNER))
        .map(|r| r.authorization)
        .collect();
    assert_eq!(
        planner_auth,
        vec![Some("_dremiostale".to_string()), Some("_dremiofresh".to_string())]
    );
}

#[tokio::test]
async fn test_persistent_rejection_exhausts_retries() {
    let transport = MockTransport::new()
        .with_response(LOGIN, 401, "{}")
        .with_response(PLANNER, 401, "");
    let mut session = connect(&transport).await;

    assert_eq!(session.diagnose("SELECT 1").await, UNABLE_TO_LOGIN_MESSAGE);
    assert_eq!(
        transport.request_count(PLANNER),
        MAX_DIAGNOSE_ATTEMPTS as usize
    );
    assert_eq!(
        transport.request_count(LOGIN),
        1 + MAX_DIAGNOSE_ATTEMPTS as usize
    );
}

#[tokio::test]
async fn test_attempt_budget_is_configurable() {
    let transport = MockTransport::new()
        .with_login_token("t")
        .with_response(PLANNER, 401, "");
    let mut session = connect(&transport).await;

    let message = session.diagnose_with_attempts("SELECT 1", 0, 1).await;

    assert_eq!(message, UNABLE_TO_LOGIN_MESSAGE);
    assert_eq!(transport.request_count(PLANNER), 1);
}

#[tokio::test]
async fn test_unexpected_status_returns_body() {
    let transport = MockTransport::new()
        .with_login_token("t")
        .with_response(PLANNER, 503, "Service Unavailable");
    let mut session = connect(&transport).await;

    assert_eq!(session.diagnose("SELECT 1").await, "Service Unavailable");
}
