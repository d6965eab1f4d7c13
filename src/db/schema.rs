//! Catalog schema listing for the Dremio runner.
//!
//! Groups `INFORMATION_SCHEMA.COLUMNS` rows into qualified tables.

use super::{Row, Value};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

macro_rules! excluded_schema_pattern {
    () => {
        "^(sys|__accelerator|INFORMATION_SCHEMA|Samples).*"
    };
}

/// Schema names matching this pattern are system or internal schemas.
pub const EXCLUDED_SCHEMA_PATTERN: &str = excluded_schema_pattern!();

/// Introspection query listing every user-visible column.
pub const SCHEMA_QUERY: &str = concat!(
    "\n        select * from INFORMATION_SCHEMA.COLUMNS\n",
    "        where not REGEXP_LIKE(TABLE_SCHEMA, '",
    excluded_schema_pattern!(),
    "')\n        ",
);

fn excluded_schema_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EXCLUDED_SCHEMA_PATTERN).expect("valid schema pattern"))
}

/// Returns true if the schema name belongs to a system or internal schema.
pub fn is_system_schema(schema: &str) -> bool {
    excluded_schema_regex().is_match(schema)
}

/// A table in the catalog, named `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTable {
    /// Qualified table name.
    pub name: String,

    /// Column names in the order they were listed.
    pub columns: Vec<String>,
}

impl SchemaTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }
}

fn text_of(row: &Row, key: &str) -> String {
    row.get(key).map(Value::as_text).unwrap_or_default()
}

/// Groups `INFORMATION_SCHEMA.COLUMNS` rows by qualified table name.
///
/// Tables keep the order in which they are first seen; columns are appended
/// in row order without deduplication. Rows from system schemas are skipped.
pub fn group_schema_rows<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Vec<SchemaTable> {
    let mut tables: IndexMap<String, SchemaTable> = IndexMap::new();

    for row in rows {
        let schema = text_of(row, "TABLE_SCHEMA");
        if is_system_schema(&schema) {
            continue;
        }
        let table_name = format!("{}.{}", schema, text_of(row, "TABLE_NAME"));

        tables
            .entry(table_name.clone())
            .or_insert_with(|| SchemaTable::new(table_name))
            .columns
            .push(text_of(row, "COLUMN_NAME"));
    }

    tables.into_values().collect()
}
