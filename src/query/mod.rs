//! Query processing module
//!
//! This module runs ad-hoc SQL typed by a user against the store.
//!
//! # Workflow
//!
//! 1. **Normalize**: trim the input, append `;` when missing
//! 2. **Execute**: run every statement in one timed engine call
//! 3. **Report**: hand back result sets with timing, or the engine's message

pub mod executor;

// Re-export main types for convenience
pub use executor::QueryExecutor;
