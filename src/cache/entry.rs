//! Cache record definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::hash::ContentHash;

/// One cached image: its metadata and where its bytes live on disk.
///
/// Records are created once, the first time their content hash is seen,
/// and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Surrogate key assigned by the store.
    pub id: i64,
    /// Image title as reported by the APOD service.
    pub title: String,
    /// Free-form description of the image.
    pub explanation: String,
    /// Absolute path of the stored image file.
    pub file_path: PathBuf,
    /// SHA-256 of the image bytes; unique across records.
    pub content_hash: ContentHash,
}
