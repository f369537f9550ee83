//! Ad-hoc query executor
//!
//! Runs one free-form input against the store. Input is trimmed and terminated
//! with `;` when needed, then executed statement by statement in a single call.
//! Engine errors come back as [`QueryResult::Failure`]; the only error returned
//! to the caller is a store that is not ready yet.
//!
//! # Example
//!
//! ```rust,no_run
//! use rowfarm::database::{StoreHandle, StoreSource};
//! use rowfarm::query::QueryExecutor;
//!
//! # async fn demo() -> rowfarm::Result<()> {
//! let handle = StoreHandle::new();
//! handle.initialize(StoreSource::Memory).await?;
//!
//! let executor = QueryExecutor::new(handle);
//! let result = executor.execute(" select count(*) from items ")?;
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```

use crate::database::StoreHandle;
use crate::error::{Error, Result};
use crate::types::QueryResult;
use crate::utils::Helpers;
use log::{debug, warn};
use std::time::Instant;

/// Statement terminator appended during normalization
pub const STATEMENT_TERMINATOR: char = ';';

/// Query executor
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    handle: StoreHandle,
}

impl QueryExecutor {
    /// Create a new query executor
    ///
    /// # Arguments
    /// * `handle` - Store the queries run against
    pub fn new(handle: StoreHandle) -> Self {
        Self { handle }
    }

    /// Trim the input and make sure it ends with a statement terminator
    pub fn normalize(raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.ends_with(STATEMENT_TERMINATOR) {
            trimmed.to_string()
        } else {
            format!("{}{}", trimmed, STATEMENT_TERMINATOR)
        }
    }

    /// Execute one ad-hoc input
    ///
    /// Only the engine call is timed. Statements that ran before a failing one
    /// stay applied.
    ///
    /// # Arguments
    /// * `raw` - User input, possibly several statements
    ///
    /// # Returns
    /// `Ok(QueryResult)` for both successful and failed executions,
    /// `Err(Error::NotReady)` if the store is not initialized
    pub fn execute(&self, raw: &str) -> Result<QueryResult> {
        let store = self.handle.ready()?;
        let sql = Self::normalize(raw);

        let start = Instant::now();
        let outcome = store.exec(&sql);
        let elapsed = start.elapsed();

        match outcome {
            Ok(result_sets) => {
                debug!(
                    "query produced {} result set(s) in {}",
                    result_sets.len(),
                    Helpers::format_duration_from(elapsed)
                );
                Ok(QueryResult::Success {
                    result_sets,
                    elapsed,
                })
            }
            Err(e) => {
                warn!("query failed: {}", e);
                Ok(QueryResult::Failure {
                    message: failure_message(e),
                })
            }
        }
    }
}

fn failure_message(err: Error) -> String {
    match err {
        Error::Engine(inner) => inner.to_string(),
        other => other.to_string(),
    }
}
