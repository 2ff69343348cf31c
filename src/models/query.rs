//! Query-related data models.
//!
//! This module defines the values that flow into and out of the query
//! executor: positional parameters and the result of running a statement.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// One decoded row, column name to JSON value, in SELECT order.
pub type JsonRow = serde_json::Map<String, JsonValue>;

/// A parameter value for parameterized queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// Metadata returned by a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationSummary {
    pub affected_rows: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<u64>,
}

impl MutationSummary {
    pub fn new(affected_rows: u64, insert_id: Option<u64>) -> Self {
        Self {
            affected_rows,
            insert_id,
        }
    }
}

/// Outcome of running one statement, discriminated by statement kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResult {
    /// Rows produced by a read statement, in server order.
    Rows { rows: Vec<JsonRow> },
    /// Summary produced by a write statement.
    Mutation(MutationSummary),
}
