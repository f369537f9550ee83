//! Database management module
//!
//! This module wraps the embedded SQLite engine behind the small surface the
//! harness needs.
//!
//! The database management module consists of:
//! - `schema`: Table definitions and the idempotent bootstrap
//! - `store`: The engine connection and the shared, lifecycle-checked handle
//! - `storage`: Binary snapshot export and reload
//!
//! # Overview
//!
//! The store must be ready before anything else runs:
//! 1. **Initialize**: open the engine (memory, file or snapshot image)
//! 2. **Bootstrap**: create `items` and `subitems` when absent
//! 3. **Use**: generate rows, run queries, export snapshots

pub mod schema;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use schema::{SchemaBootstrapper, Table};
pub use storage::{Exporter, Snapshot, SNAPSHOT_FILE_NAME, SNAPSHOT_MIME_TYPE};
pub use store::{Lifecycle, Store, StoreHandle, StoreSource};
