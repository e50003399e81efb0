//! Content-addressable cache manager.
//!
//! This module provides:
//! - The [`CacheManager::ensure_cached`] pipeline
//! - Media URL resolution
//! - Deterministic file name derivation ([`derive_path`])
//! - The [`CacheError`] taxonomy surfaced to callers

pub mod cache_manager;
pub mod paths;

use std::path::PathBuf;
use thiserror::Error;

use crate::apod::RetrievalError;
use crate::cache::StoreError;

pub use cache_manager::{resolve_image_url, CacheManager};
pub use paths::{derive_path, derive_qualified_path, normalize_title, url_extension};

/// Failures of [`CacheManager::ensure_cached`]. None are retried internally.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Network or remote failure, non-success status, or malformed payload.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// The picture for the date is neither an image nor a video.
    #[error("unsupported media type: '{0}'")]
    UnsupportedMedia(String),

    /// The metadata store or the image file could not be written or read.
    #[error("cache storage failed: {0}")]
    Store(#[from] StoreError),

    /// Every candidate file name is occupied by a different image.
    #[error("file name collision at {}: occupied by a different image", .path.display())]
    FileCollision { path: PathBuf },
}
