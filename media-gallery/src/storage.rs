//! Durable writes of original and thumbnail bytes.
//!
//! Files are opened append-or-create and never truncated; the storage root
//! is append-only from the pipeline's point of view.

use crate::error::StorageError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Locations of both files written for one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPair {
    pub original: PathBuf,
    pub thumbnail: PathBuf,
    pub original_bytes: u64,
    pub thumbnail_bytes: u64,
}

/// Writes assets under `<root>/` and their thumbnails under `<root>/<thumbnail_dir>/`
#[derive(Debug, Clone)]
pub struct StorageWriter {
    root: PathBuf,
    thumbnail_dir: String,
}

impl StorageWriter {
    pub fn new(root: impl Into<PathBuf>, thumbnail_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            thumbnail_dir: thumbnail_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn thumbnail_root(&self) -> PathBuf {
        self.root.join(&self.thumbnail_dir)
    }

    /// Appends `bytes` to `<directory>/<name>`, creating directory and file if needed.
    ///
    /// The file handle is dropped on every return path.
    pub fn write(&self, bytes: &[u8], directory: &Path, name: &str) -> Result<u64, StorageError> {
        let path = directory.join(name);
        let io_err = |source| StorageError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(directory).map_err(io_err)?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(io_err)?;
        file.write_all(bytes).map_err(io_err)?;
        file.sync_data().map_err(io_err)?;

        log::debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(bytes.len() as u64)
    }

    /// Writes the original and then the thumbnail for `name`.
    ///
    /// A thumbnail failure after a successful original write is reported as
    /// [`StorageError::PartialWrite`] so callers can tell it apart from a
    /// write that left nothing behind.
    pub fn write_pair(
        &self,
        original: &[u8],
        thumbnail: &[u8],
        name: &str,
    ) -> Result<StoredPair, StorageError> {
        let original_bytes = self.write(original, &self.root, name)?;

        let thumbnail_root = self.thumbnail_root();
        let thumbnail_bytes = match self.write(thumbnail, &thumbnail_root, name) {
            Ok(n) => n,
            Err(StorageError::Io { path, source }) => {
                return Err(StorageError::PartialWrite {
                    written: self.root.join(name),
                    failed: path,
                    source,
                })
            }
            Err(e) => return Err(e),
        };

        Ok(StoredPair {
            original: self.root.join(name),
            thumbnail: thumbnail_root.join(name),
            original_bytes,
            thumbnail_bytes,
        })
    }
}
