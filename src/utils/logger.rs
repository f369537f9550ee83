//! Logging setup
//!
//! Log output goes through the `log` facade and is printed by `env_logger`.
//! `RUST_LOG` still overrides the level chosen here, so
//! `RUST_LOG=rowfarm=debug` shows every progress report and query timing.
//!
//! # Example
//!
//! ```rust
//! use rowfarm::utils::Logger;
//!
//! Logger::init();
//! log::info!("harness started");
//! ```

use log::LevelFilter;

/// Logger initialization
pub struct Logger;

impl Logger {
    /// Initialize the logger at `info`
    ///
    /// Calling this more than once is harmless; later calls are ignored.
    pub fn init() {
        Self::init_with_level(LevelFilter::Info);
    }

    /// Initialize the logger with a custom log level
    ///
    /// # Arguments
    /// * `level` - Default level filter, overridden by `RUST_LOG`
    pub fn init_with_level(level: LevelFilter) {
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .try_init();
    }
}
