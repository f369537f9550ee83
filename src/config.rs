//! Harness configuration
//!
//! Configuration is read from an optional JSON file. Every field has a default,
//! so an empty object (or no file at all) yields a working in-memory setup.
//!
//! ```json
//! {
//!   "database": "data/rows.sqlite",
//!   "total_items": 100000,
//!   "progress_interval": 200,
//!   "frame_interval_ms": 16,
//!   "seed": 7,
//!   "log_level": "debug"
//! }
//! ```

use crate::database::StoreSource;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Items created by a default generation run.
pub const DEFAULT_TOTAL_ITEMS: u64 = 500_000;

/// Iterations between two progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 200;

/// Frame tick used by the frame scheduler (roughly 60 frames per second).
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Configuration for the harness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Database file; an in-memory store is used when absent
    pub database: Option<PathBuf>,

    /// Items created per generation run
    pub total_items: u64,

    /// Iterations between progress reports
    pub progress_interval: u64,

    /// Frame tick in milliseconds
    pub frame_interval_ms: u64,

    /// Seed for reproducible row names
    pub seed: Option<u64>,

    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            database: None,
            total_items: DEFAULT_TOTAL_ITEMS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            seed: None,
            log_level: "info".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the JSON file
    ///
    /// # Returns
    /// `Ok(HarnessConfig)` if the file parses and validates, `Err` otherwise
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: HarnessConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all values are usable
    pub fn validate(&self) -> Result<()> {
        if self.total_items == 0 {
            return Err(Error::Config("total_items must be at least 1".to_string()));
        }
        if self.progress_interval == 0 {
            return Err(Error::Config(
                "progress_interval must be at least 1".to_string(),
            ));
        }
        if self.frame_interval_ms == 0 {
            return Err(Error::Config(
                "frame_interval_ms must be at least 1".to_string(),
            ));
        }
        self.level_filter()?;
        Ok(())
    }

    /// Where the store should be loaded from
    pub fn store_source(&self) -> StoreSource {
        match &self.database {
            Some(path) => StoreSource::File(path.clone()),
            None => StoreSource::Memory,
        }
    }

    /// Frame tick as a duration
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Parsed log level
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| Error::Config(format!("unknown log level: {}", self.log_level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.total_items, 500_000);
        assert_eq!(config.progress_interval, 200);
        assert_eq!(config.store_source(), StoreSource::Memory);
        assert_eq!(config.frame_interval(), Duration::from_millis(16));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"total_items": 1000, "seed": 3, "database": "rows.sqlite"}}"#).unwrap();

        let config = HarnessConfig::from_file(file.path()).unwrap();
        assert_eq!(config.total_items, 1000);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(
            config.store_source(),
            StoreSource::File(PathBuf::from("rows.sqlite"))
        );
    }

    #[test]
    fn test_from_file_rejects_zero_items() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"total_items": 0}}"#).unwrap();

        let err = HarnessConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = HarnessConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_level_filter() {
        let mut config = HarnessConfig::default();
        config.log_level = "debug".to_string();
        assert_eq!(config.level_filter().unwrap(), log::LevelFilter::Debug);

        config.log_level = "chatty".to_string();
        assert!(config.validate().is_err());
    }
}
