use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Deserialize `null` (or a missing field, with `#[serde(default)]`) into the type's default.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A single log entry as returned by the tenant's query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogRecord {
    /// Epoch milliseconds.
    #[serde(default, deserialize_with = "null_default")]
    pub timestamp: i64,
    #[serde(default, rename = "traceID", deserialize_with = "null_default")]
    pub trace_id: String,
    #[serde(default, rename = "spanID", deserialize_with = "null_default")]
    pub span_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_default")]
    pub severity: String,
    #[serde(default, deserialize_with = "null_default")]
    pub attributes: BTreeMap<String, String>,
}

impl LogRecord {
    /// Compares the scalar fields only. `attributes` is not part of the comparison.
    pub fn same_entry(&self, other: &LogRecord) -> bool {
        self.timestamp == other.timestamp
            && self.trace_id == other.trace_id
            && self.span_id == other.span_id
            && self.severity == other.severity
            && self.message == other.message
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOp {
    #[serde(rename = "eq")]
    Equals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BoolOp {
    #[serde(rename = "AND")]
    And,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterMatch {
    pub key: String,
    pub op: MatchOp,
    pub value: String,
}

impl FilterMatch {
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        FilterMatch {
            key: key.into(),
            op: MatchOp::Equals,
            value: value.into(),
        }
    }
}

/// Boolean combination of match clauses sent with every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub op: BoolOp,
    #[serde(rename = "match")]
    pub matches: Vec<FilterMatch>,
}

impl Default for Filter {
    fn default() -> Self {
        Filter {
            op: BoolOp::And,
            matches: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// The time range and paging parameters of the next query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    /// Inclusive lower bound, epoch milliseconds.
    pub start: i64,
    /// Upper bound, epoch milliseconds.
    pub end: i64,
    pub limit: u32,
    pub sort: SortOrder,
}

impl QueryWindow {
    /// Moves `start` past `timestamp`. Never moves it backwards.
    pub fn advance_past(&mut self, timestamp: i64) {
        self.start = self.start.max(timestamp.saturating_add(1));
    }
}
