//! Bulk generation module
//!
//! This module fills the store with synthetic parent/child rows while handing
//! control back to the host between batches.
//!
//! The generation module consists of:
//! - `bulk`: The generator and its pull-based progress sequence
//! - `scheduler`: Suspension points supplied by the host
//!
//! # Example
//!
//! ```rust,no_run
//! use rowfarm::database::{StoreHandle, StoreSource};
//! use rowfarm::generator::{BulkGenerator, CooperativeScheduler};
//! use rowfarm::names::RandomNames;
//!
//! # async fn demo() -> rowfarm::Result<()> {
//! let handle = StoreHandle::new();
//! handle.initialize(StoreSource::Memory).await?;
//!
//! let mut run = BulkGenerator::new(handle).generate(10_000, CooperativeScheduler, RandomNames::new())?;
//! while let Some(progress) = run.next().await {
//!     println!("rows: {}", progress?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod scheduler;

// Re-export main types for convenience
pub use bulk::{BulkGenerator, Generation, SUBITEMS_PER_ITEM};
pub use scheduler::{CooperativeScheduler, FrameScheduler, ImmediateScheduler, Scheduler};
