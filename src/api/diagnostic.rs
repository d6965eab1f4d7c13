//! Planner error diagnostics.
//!
//! Turns the planning endpoint's 400 response into a single readable string:
//! the top-level code and message followed by one line per reported error.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

/// Marker preceding the parser's own message in planner error text.
const PARSE_EXCEPTION_MARKER: &str = "org.apache.calcite.sql.parser.SqlParseException";

/// Bytes skipped from the start of [`PARSE_EXCEPTION_MARKER`]: the class name
/// plus the separator that follows it.
const PARSE_EXCEPTION_SKIP: usize = 48;

/// Marker ending the parser's message (start of the stack frames).
const PLANNER_FRAME_MARKER: &str = "com.dremio.exec.planner.sql.parser";

/// Message used when a planner error carries no `message` field.
const MISSING_MESSAGE: &str = " \n ";

/// How absent values render in a diagnostic.
const ABSENT: &str = "None";

fn leading_comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?s)/\*.*?\*/").expect("valid comment pattern"))
}

/// Removes a single leading `/* ... */` comment and surrounding whitespace.
///
/// Only a comment at the very start of the text is removed; later comments
/// are left alone.
pub fn strip_leading_comment(sql: &str) -> &str {
    match leading_comment_regex().find(sql) {
        Some(m) => sql[m.end()..].trim(),
        None => sql.trim(),
    }
}

/// One error reported by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticDetail {
    pub message: String,
    /// Start position as reported; any JSON value is rendered as-is.
    pub line: Option<Value>,
    pub column: Option<Value>,
}

impl fmt::Display for DiagnosticDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error {} at Line {} and column {}",
            self.message,
            render_value(self.line.as_ref()),
            render_value(self.column.as_ref())
        )
    }
}

/// Top-level shape of a planner 400 response.
///
/// Every field is kept loose so one malformed field only degrades that
/// part of the diagnostic.
#[derive(Debug, Default, Deserialize)]
struct PlannerErrorResponse {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<Value>,
    #[serde(default)]
    details: Option<Value>,
}

/// Renders a loose JSON value the way it reads in a message.
fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => ABSENT.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Extracts the parser's own message from a stack-trace-like error text.
///
/// Returns `None` when either marker is missing.
fn refined_message(message: &str) -> Option<&str> {
    let start = message.find(PARSE_EXCEPTION_MARKER)?;
    let end = start + message[start..].find(PLANNER_FRAME_MARKER)?;
    let from = (start + PARSE_EXCEPTION_SKIP).min(message.len());
    if from >= end {
        return Some("");
    }
    Some(&message[from..end])
}

fn first_line(message: &str) -> &str {
    message.split('\n').next().unwrap_or_default()
}

/// Builds the detail for one entry of `details.errors`.
pub fn parse_error_entry(entry: &Value) -> DiagnosticDetail {
    let raw = match entry.get("message") {
        None | Some(Value::Null) => MISSING_MESSAGE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    let ascii: String = raw.chars().filter(char::is_ascii).collect();

    let short = first_line(&ascii);
    let refined = refined_message(&ascii).unwrap_or(short);

    let range = entry.get("range");
    let position = |key: &str| range.and_then(|r| r.get(key)).cloned();

    DiagnosticDetail {
        message: format!("{short} {refined}"),
        line: position("startLine"),
        column: position("startColumn"),
    }
}

/// Joins per-error lines with newlines, in report order.
pub fn render_details(details: &[DiagnosticDetail]) -> String {
    details
        .iter()
        .map(DiagnosticDetail::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Composes the final diagnostic string.
pub fn render_diagnostic(code: &str, error_message: &str, details: &str) -> String {
    format!("{code}: {error_message} \n\nDETAILS\n\n{details}")
}

/// Renders a planner 400 response body into a diagnostic.
///
/// A body that is not JSON at all is returned verbatim.
pub fn render_planner_error(body: &str) -> String {
    let response: PlannerErrorResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(_) => return body.to_string(),
    };

    let details: Vec<DiagnosticDetail> = response
        .details
        .as_ref()
        .and_then(|d| d.get("errors"))
        .and_then(Value::as_array)
        .map(|errors| errors.iter().map(parse_error_entry).collect())
        .unwrap_or_default();

    render_diagnostic(
        &render_value(response.code.as_ref()),
        &render_value(response.error_message.as_ref()),
        &render_details(&details),
    )
}
