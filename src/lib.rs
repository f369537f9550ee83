//! Rowfarm: bulk-load, query and export an embedded SQLite store
//!
//! This library drives a single embedded SQLite database through three
//! operations:
//! - bulk generation of parent/child rows with cooperative progress reporting
//! - ad-hoc query execution with timing and contained failures
//! - export of the complete binary database image
//!
//! # Example
//!
//! ```rust,no_run
//! use rowfarm::*;
//!
//! # async fn demo() -> rowfarm::Result<()> {
//! let handle = StoreHandle::new();
//! handle.initialize(StoreSource::Memory).await?;
//!
//! // Generate rows, yielding to the runtime between batches
//! let last = BulkGenerator::new(handle.clone())
//!     .generate(10_000, CooperativeScheduler, RandomNames::new())?
//!     .run(|progress| println!("rows: {}", progress))
//!     .await?;
//! assert_eq!(last.rows(), 30_000);
//!
//! // Query the result
//! let result = QueryExecutor::new(handle.clone()).execute("select count(*) from subitems")?;
//! println!("{}", result);
//!
//! // Export the database image
//! let snapshot = Exporter::new(handle).export_snapshot()?;
//! snapshot.save(snapshot.file_name())?;
//! # Ok(())
//! # }
//! ```

/// Rowfarm version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Main modules
pub mod config;
pub mod error;
pub mod names;
pub mod types;

pub mod database;
pub mod generator;
pub mod query;
pub mod utils;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for convenience
pub use config::HarnessConfig;
pub use database::{Exporter, Snapshot, StoreHandle, StoreSource};
pub use error::{Error, Result};
pub use generator::{BulkGenerator, CooperativeScheduler, FrameScheduler, Generation, Scheduler};
pub use names::{NameSource, RandomNames};
pub use query::QueryExecutor;
pub use types::{Progress, QueryResult, ResultSet, Value};
