//! Query result types for the Dremio runner.
//!
//! Defines the raw shape reported by the data-access driver and the typed
//! result payload handed back to the host.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic column type understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Integer,
    Float,
    String,
    Date,
    Datetime,
    Boolean,
}

/// Driver type codes with a known semantic mapping.
pub mod type_codes {
    pub const INTEGER: i32 = 0;
    pub const FLOAT: i32 = 1;
    pub const STRING: i32 = 2;
    pub const DATE: i32 = 3;
    pub const DATETIME: i32 = 4;
    pub const LONG_STRING: i32 = 5;
    pub const TIME: i32 = 6;
    pub const BOOLEAN: i32 = 13;
}

/// Maps a driver-reported `(type_code, scale)` pair to a semantic type.
///
/// An integer code with a nonzero scale is promoted to float. Unknown codes
/// map to `None`.
pub fn determine_type(type_code: i32, scale: i16) -> Option<SemanticType> {
    let mapped = match type_code {
        type_codes::INTEGER => SemanticType::Integer,
        type_codes::FLOAT => SemanticType::Float,
        type_codes::STRING | type_codes::LONG_STRING => SemanticType::String,
        type_codes::DATE => SemanticType::Date,
        type_codes::DATETIME | type_codes::TIME => SemanticType::Datetime,
        type_codes::BOOLEAN => SemanticType::Boolean,
        _ => return None,
    };

    if mapped == SemanticType::Integer && scale > 0 {
        return Some(SemanticType::Float);
    }
    Some(mapped)
}

/// A single value from a result row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text value; dates and timestamps are carried as their text form.
    String(String),
}

impl Value {
    /// Renders the value as plain text (NULL becomes an empty string).
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.as_text()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Column metadata as reported by the driver's cursor description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: String,
    pub type_code: i32,
    pub scale: i16,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, type_code: i32, scale: i16) -> Self {
        Self {
            name: name.into(),
            type_code,
            scale,
        }
    }
}

/// Untyped result of one execution: a description snapshot plus row tuples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    pub columns: Vec<RawColumn>,
    pub rows: Vec<Vec<Value>>,
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Semantic type, `null` when the driver type is unmapped.
    #[serde(rename = "type")]
    pub column_type: Option<SemanticType>,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, column_type: Option<SemanticType>) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A row of data keyed by column name.
pub type Row = IndexMap<String, Value>;

/// Represents the result of executing a SQL query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Builds a typed result from a raw driver result.
    ///
    /// Each row is zipped positionally with the column names; a repeated
    /// column name overwrites the earlier value in that row.
    pub fn from_raw(raw: RawResult) -> Self {
        let columns: Vec<ColumnInfo> = raw
            .columns
            .iter()
            .map(|c| ColumnInfo::new(c.name.clone(), determine_type(c.type_code, c.scale)))
            .collect();

        let rows = raw
            .rows
            .into_iter()
            .map(|values| {
                columns
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(values)
                    .collect::<Row>()
            })
            .collect();

        Self { columns, rows }
    }

    /// Serializes the result as the host's JSON payload.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
