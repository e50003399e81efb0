//! On-disk layout of the image cache.

use std::io;
use std::path::{Path, PathBuf};

/// File name of the SQLite metadata store inside the cache directory.
pub const DB_FILE_NAME: &str = "image_cache.db";

/// Directory holding the metadata store and the downloaded images.
///
/// Passed explicitly to [`MetadataStore::initialize`](super::MetadataStore::initialize)
/// and [`CacheManager::new`](crate::manager::CacheManager::new) so no component
/// relies on process-wide state for where the cache lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    dir: PathBuf,
}

impl CacheLocation {
    /// Create a location rooted at `dir`.
    ///
    /// Relative paths are resolved against the current working directory so
    /// every stored file path is absolute. The directory itself is not
    /// created here.
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = std::path::absolute(dir.as_ref())?;
        Ok(Self { dir })
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the SQLite metadata store.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.dir.join(DB_FILE_NAME)
    }
}
