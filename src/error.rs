//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur while driving the store.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation was attempted before the store finished initializing.
    #[error("store is not initialized")]
    NotReady,

    /// `initialize` was called on a handle that already holds a ready store.
    #[error("store is already initialized")]
    AlreadyInitialized,

    /// The storage engine could not be loaded.
    #[error("failed to load storage engine: {0}")]
    Initialization(String),

    /// A file handed in as a snapshot is not a SQLite image.
    #[error("not a SQLite database image: {0}")]
    InvalidSnapshot(String),

    /// The schema bootstrap statements failed.
    #[error("schema bootstrap failed: {0}")]
    Bootstrap(#[source] rusqlite::Error),

    /// Engine-level error.
    #[error("engine error: {0}")]
    Engine(#[from] rusqlite::Error),

    /// A previous holder of the connection lock panicked.
    #[error("store connection lock poisoned")]
    LockPoisoned,

    /// Bulk generation needs at least one item.
    #[error("item count must be at least 1, got {0}")]
    InvalidItemCount(u64),

    /// An insert failed part way through a bulk generation run.
    #[error("bulk generation aborted at iteration {iteration}: {source}")]
    GenerationAborted {
        /// Loop iteration that failed.
        iteration: u64,
        /// Underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;
