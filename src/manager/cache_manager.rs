//! The `ensure_cached` pipeline.
//!
//! One call runs fetch → resolve URL → download → hash → dedup check →
//! path derivation → write → insert, and ends either in a cache hit (the
//! existing record is returned untouched) or in a newly created record.
//! Failures commit no record.

use chrono::NaiveDate;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::paths::{derive_path, derive_qualified_path};
use super::CacheError;
use crate::apod::{MediaKind, MediaMetadata, Retrieval, RetrievalError};
use crate::cache::{CacheLocation, CacheRecord, ContentHash, MetadataStore, StoreError};

/// Pick the URL whose bytes represent the picture.
///
/// Images use the high-resolution URL, videos their thumbnail. Any other
/// media kind is refused.
pub fn resolve_image_url(meta: &MediaMetadata) -> Result<&str, CacheError> {
    let (url, field) = match &meta.media_kind {
        MediaKind::Image => (meta.image_url.as_deref(), "high-resolution image URL"),
        MediaKind::Video => (meta.video_url.as_deref(), "video thumbnail URL"),
        MediaKind::Other(kind) => return Err(CacheError::UnsupportedMedia(kind.clone())),
    };
    url.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
        CacheError::Retrieval(RetrievalError::Malformed(format!(
            "{} media for {} has no {}",
            meta.media_kind, meta.date, field
        )))
    })
}

/// Outcome of trying to place image bytes at a path.
enum Placement {
    /// Bytes were written to a new file.
    Written,
    /// The file already held exactly these bytes.
    Reused,
    /// The path holds different content.
    Occupied,
}

/// Write `bytes` to `path` without ever replacing an existing file.
fn place_file(path: &Path, bytes: &[u8], hash: &ContentHash) -> Result<Placement, StoreError> {
    let io_err = |source: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => {
            write_or_remove(path, file, |f| {
                f.write_all(bytes)?;
                f.sync_all()
            })
            .map_err(io_err)?;
            Ok(Placement::Written)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let existing = fs::read(path).map_err(io_err)?;
            if ContentHash::of(&existing) == *hash {
                Ok(Placement::Reused)
            } else {
                Ok(Placement::Occupied)
            }
        }
        Err(e) => Err(io_err(e)),
    }
}

/// Fill a freshly created file, deleting it again if `write` fails.
///
/// A file at a derived name is either complete or absent.
fn write_or_remove<F>(path: &Path, mut file: File, write: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let result = write(&mut file);
    drop(file);
    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!(
                "Failed to remove partial image file {}: {}",
                path.display(),
                e
            );
        }
    }
    result
}

/// Rejects metadata whose title or explanation is blank.
fn check_text_fields(meta: &MediaMetadata) -> Result<(), CacheError> {
    for (value, field) in [(&meta.title, "title"), (&meta.explanation, "explanation")] {
        if value.trim().is_empty() {
            return Err(CacheError::Retrieval(RetrievalError::Malformed(format!(
                "media for {} has an empty {}",
                meta.date, field
            ))));
        }
    }
    Ok(())
}

/// Orchestrates retrieval, deduplication and storage of APOD images.
///
/// Holds no state between calls beyond the store and the cache directory.
pub struct CacheManager<R> {
    location: CacheLocation,
    store: MetadataStore,
    retrieval: R,
}

impl<R: Retrieval> CacheManager<R> {
    /// Create a manager over an already initialized store.
    pub fn new(location: CacheLocation, store: MetadataStore, retrieval: R) -> Self {
        Self {
            location,
            store,
            retrieval,
        }
    }

    /// Initialize the store at `location` and create a manager over it.
    pub fn open(location: CacheLocation, retrieval: R) -> Result<Self, CacheError> {
        let store = MetadataStore::initialize(&location)?;
        Ok(Self::new(location, store, retrieval))
    }

    /// The underlying metadata store.
    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Cache directory.
    pub fn cache_dir(&self) -> &Path {
        self.location.dir()
    }

    /// Make sure the picture for `date` is cached and return its record.
    ///
    /// Repeated calls, for this date or any date whose image has identical
    /// bytes, return the same record and never write a second file.
    ///
    /// # Errors
    ///
    /// * [`CacheError::Retrieval`] if metadata or bytes cannot be fetched, or
    ///   the metadata has a blank title or explanation.
    /// * [`CacheError::UnsupportedMedia`] for media other than images and videos.
    /// * [`CacheError::Store`] if the file or the record cannot be written. A
    ///   failed file write leaves no file behind; a failed insert leaves the
    ///   complete file, which the next call reuses.
    /// * [`CacheError::FileCollision`] if unrelated files occupy every candidate name.
    pub fn ensure_cached(&self, date: NaiveDate) -> Result<CacheRecord, CacheError> {
        log::info!("APOD date: {}", date);
        let meta = self.retrieval.fetch_metadata(date)?;
        check_text_fields(&meta)?;
        log::info!("Image title: {}", meta.title);

        let url = resolve_image_url(&meta)?;
        log::info!("Image URL: {}", url);

        let bytes = self.retrieval.download(url)?;
        let hash = ContentHash::of(&bytes);
        log::debug!("SHA-256: {} ({} bytes)", hash, bytes.len());

        if let Some(existing) = self.store.find_by_hash(&hash)? {
            log::info!(
                "Image already cached as record {}: {}",
                existing.id,
                existing.file_path.display()
            );
            return Ok(existing);
        }

        let file_path = self.store_bytes(&meta.title, url, &bytes, &hash)?;
        let id = self
            .store
            .insert(&meta.title, &meta.explanation, &file_path, &hash)?;
        log::info!("Cached new image as record {}: {}", id, file_path.display());

        Ok(CacheRecord {
            id,
            title: meta.title,
            explanation: meta.explanation,
            file_path,
            content_hash: hash,
        })
    }

    /// Write the bytes under the plain derived name, falling back to a
    /// hash-qualified name if another image already has it.
    fn store_bytes(
        &self,
        title: &str,
        url: &str,
        bytes: &[u8],
        hash: &ContentHash,
    ) -> Result<PathBuf, CacheError> {
        let dir = self.location.dir();
        let candidates = [
            derive_path(dir, title, url),
            derive_qualified_path(dir, title, url, hash),
        ];

        for path in candidates {
            match place_file(&path, bytes, hash)? {
                Placement::Written => return Ok(path),
                Placement::Reused => {
                    log::warn!("Reusing orphaned image file: {}", path.display());
                    return Ok(path);
                }
                Placement::Occupied => {
                    log::debug!("Name taken by a different image: {}", path.display());
                }
            }
        }

        Err(CacheError::FileCollision {
            path: derive_path(dir, title, url),
        })
    }
}
