//! Snapshot export
//!
//! An exported [`Snapshot`] is the complete SQLite file image of the store at
//! the moment of the call. It holds no reference to the live store and can be
//! written to disk or loaded back into a fresh engine instance.
//!
//! # Example
//!
//! ```rust,no_run
//! use rowfarm::database::{Exporter, StoreHandle, StoreSource};
//!
//! # async fn demo() -> rowfarm::Result<()> {
//! let handle = StoreHandle::new();
//! handle.initialize(StoreSource::Memory).await?;
//!
//! let snapshot = Exporter::new(handle).export_snapshot()?;
//! snapshot.save(snapshot.file_name())?;
//!
//! // Re-initialize a second engine from the image
//! let copy = StoreHandle::new();
//! copy.initialize(snapshot.into_source()).await?;
//! # Ok(())
//! # }
//! ```

use crate::database::store::{StoreHandle, StoreSource};
use crate::error::{Error, Result};
use crate::utils::Helpers;
use log::info;
use std::fs;
use std::path::Path;

/// File name offered for downloaded snapshots
pub const SNAPSHOT_FILE_NAME: &str = "db.sqlite";

/// MIME type of a snapshot
pub const SNAPSHOT_MIME_TYPE: &str = "application/vnd.sqlite3";

/// Header every SQLite file image starts with
const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Point-in-time binary image of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Vec<u8>,
}

impl Snapshot {
    /// Wrap raw image bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Image bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into the image bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Image size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the image is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the bytes start with the SQLite file header
    pub fn has_sqlite_header(&self) -> bool {
        self.bytes.starts_with(SQLITE_MAGIC)
    }

    /// Download file name
    pub fn file_name(&self) -> &'static str {
        SNAPSHOT_FILE_NAME
    }

    /// Download MIME type
    pub fn mime_type(&self) -> &'static str {
        SNAPSHOT_MIME_TYPE
    }

    /// Source for initializing a fresh store from this image
    pub fn into_source(self) -> StoreSource {
        StoreSource::Snapshot(self.bytes)
    }

    /// Write the image to a file
    ///
    /// # Arguments
    /// * `path` - File path to write to
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), &self.bytes)?;
        info!(
            "wrote {} snapshot to {}",
            Helpers::format_bytes(self.bytes.len() as u64),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Read an image back from a file
    ///
    /// # Arguments
    /// * `path` - File path to read from
    ///
    /// # Returns
    /// `Ok(Snapshot)` if the file carries the SQLite header,
    /// `Err(Error::InvalidSnapshot)` otherwise
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let snapshot = Self {
            bytes: fs::read(path.as_ref())?,
        };
        if !snapshot.has_sqlite_header() {
            return Err(Error::InvalidSnapshot(path.as_ref().display().to_string()));
        }
        info!(
            "loaded {} snapshot from {}",
            Helpers::format_bytes(snapshot.len() as u64),
            path.as_ref().display()
        );
        Ok(snapshot)
    }
}

/// Serializes the store for download
#[derive(Debug, Clone)]
pub struct Exporter {
    handle: StoreHandle,
}

impl Exporter {
    /// Create an exporter over a store handle
    pub fn new(handle: StoreHandle) -> Self {
        Self { handle }
    }

    /// Serialize the current store contents
    ///
    /// # Returns
    /// `Ok(Snapshot)` with the full image, `Err(Error::NotReady)` before
    /// initialization, or the engine failure of this call
    pub fn export_snapshot(&self) -> Result<Snapshot> {
        let store = self.handle.ready()?;
        let bytes = store.export()?;
        info!("exported {}", Helpers::format_bytes(bytes.len() as u64));
        Ok(Snapshot { bytes })
    }
}
