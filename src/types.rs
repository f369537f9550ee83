//! Core types shared by the generator, the query executor and the host layer
//!
//! This module defines:
//! - SQL values as returned by the engine
//! - Result sets and query outcomes
//! - Bulk generation progress

use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Logical rows produced per generated item (one item plus two subitems).
pub const ROWS_PER_ITEM: u64 = 3;

/// SQL value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value
    Null,

    /// 64-bit integer
    Integer(i64),

    /// Floating point number
    Real(f64),

    /// Text value
    Text(String),

    /// Raw bytes
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
        }
    }
}

/// One tabular result produced by a single statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names in the result
    pub columns: Vec<String>,

    /// Row values, one inner vector per row
    pub values: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Create a new empty result set
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            values: Vec::new(),
        }
    }

    /// Get number of rows
    pub fn num_rows(&self) -> usize {
        self.values.len()
    }

    /// Get number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

/// Outcome of one ad-hoc execution
///
/// Engine failures are carried as `Failure` rather than returned as errors, so a
/// bad statement never takes the caller down with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryResult {
    /// Every statement ran; one result set per statement that produced rows.
    Success {
        /// Result sets in statement order
        result_sets: Vec<ResultSet>,
        /// Wall-clock time spent inside the engine call
        elapsed: Duration,
    },

    /// The engine rejected the input.
    Failure {
        /// Engine error message
        message: String,
    },
}

impl QueryResult {
    /// Whether the execution succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success { .. })
    }

    /// Result sets of a successful execution, empty on failure
    pub fn result_sets(&self) -> &[ResultSet] {
        match self {
            QueryResult::Success { result_sets, .. } => result_sets,
            QueryResult::Failure { .. } => &[],
        }
    }

    /// Elapsed engine time in milliseconds, if the execution succeeded
    pub fn elapsed_ms(&self) -> Option<f64> {
        match self {
            QueryResult::Success { elapsed, .. } => Some(duration_ms(*elapsed)),
            QueryResult::Failure { .. } => None,
        }
    }

    /// Render for display: timing line plus pretty JSON, or the failure message
    pub fn render(&self) -> String {
        match self {
            QueryResult::Success {
                result_sets,
                elapsed,
            } => {
                let body = serde_json::to_string_pretty(result_sets)
                    .unwrap_or_else(|e| format!("<unrenderable result: {}>", e));
                format!("executed in {}ms\n{}", duration_ms(*elapsed), body)
            }
            QueryResult::Failure { message } => message.clone(),
        }
    }
}

fn duration_ms(elapsed: Duration) -> f64 {
    elapsed.as_nanos() as f64 / 1_000_000.0
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Cumulative logical row count reported by a bulk generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Progress(u64);

impl Progress {
    /// Progress after `items` generated items
    pub fn after_items(items: u64) -> Self {
        Self(items.saturating_mul(ROWS_PER_ITEM))
    }

    /// Logical row count
    pub fn rows(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from_value_ref() {
        assert_eq!(Value::from(ValueRef::Null), Value::Null);
        assert_eq!(Value::from(ValueRef::Integer(7)), Value::Integer(7));
        assert_eq!(Value::from(ValueRef::Real(1.5)), Value::Real(1.5));
        assert_eq!(
            Value::from(ValueRef::Text(b"abc")),
            Value::Text("abc".to_string())
        );
        assert_eq!(
            Value::from(ValueRef::Blob(&[1, 2])),
            Value::Blob(vec![1, 2])
        );
    }

    #[test]
    fn test_value_json_shape() {
        let row = vec![
            Value::Integer(1),
            Value::Text("a".to_string()),
            Value::Null,
            Value::Real(2.5),
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[1,"a",null,2.5]"#);

        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_render_success() {
        let mut set = ResultSet::new(vec!["1".to_string()]);
        set.values.push(vec![Value::Integer(1)]);
        let result = QueryResult::Success {
            result_sets: vec![set],
            elapsed: Duration::from_millis(2),
        };

        let rendered = result.render();
        assert!(rendered.starts_with("executed in 2ms\n"));
        assert!(rendered.contains("\"columns\""));
        assert!(rendered.contains("\"values\""));
        assert_eq!(result.elapsed_ms(), Some(2.0));
    }

    #[test]
    fn test_render_failure() {
        let result = QueryResult::Failure {
            message: "near \"not\": syntax error".to_string(),
        };
        assert!(!result.is_success());
        assert!(result.result_sets().is_empty());
        assert_eq!(result.to_string(), "near \"not\": syntax error");
    }

    #[test]
    fn test_query_result_tagged_json() {
        let result = QueryResult::Failure {
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn test_progress_after_items() {
        assert_eq!(Progress::after_items(200).rows(), 600);
        assert_eq!(Progress::after_items(0).rows(), 0);
        assert!(Progress::after_items(200) < Progress::after_items(400));
    }
}
