//! SQLite-backed metadata store.
//!
//! The store holds a single table, `image_apod`, mapping the SHA-256 of an
//! image to its title, explanation and on-disk path. Every operation opens its
//! own connection and drops it before returning, so nothing is held open
//! between cache requests.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::entry::CacheRecord;
use super::hash::ContentHash;
use super::location::CacheLocation;

const CREATE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS image_apod (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        title       TEXT NOT NULL,
        explanation TEXT NOT NULL,
        file_path   TEXT NOT NULL,
        sha256      TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_image_apod_sha256 ON image_apod (sha256);
";

const SELECT_COLUMNS: &str = "SELECT id, title, explanation, file_path, sha256 FROM image_apod";

/// Errors raised by the persistence medium.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure while creating the cache directory or writing an image.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite failure: unreachable, unwritable or corrupt database.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored row does not satisfy the record invariants.
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    /// The file path cannot be stored as text.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Row as read from SQLite, before validation.
struct RawRecord {
    id: i64,
    title: String,
    explanation: String,
    file_path: String,
    sha256: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            explanation: row.get(2)?,
            file_path: row.get(3)?,
            sha256: row.get(4)?,
        })
    }

    fn into_record(self) -> StoreResult<CacheRecord> {
        let content_hash = ContentHash::parse(&self.sha256).ok_or_else(|| StoreError::Corrupt {
            id: self.id,
            reason: format!("invalid sha256 '{}'", self.sha256),
        })?;
        if self.file_path.is_empty() {
            return Err(StoreError::Corrupt {
                id: self.id,
                reason: "empty file path".to_string(),
            });
        }

        Ok(CacheRecord {
            id: self.id,
            title: self.title,
            explanation: self.explanation,
            file_path: PathBuf::from(self.file_path),
            content_hash,
        })
    }
}

/// Persistent metadata store for cached images.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    db_path: PathBuf,
}

impl MetadataStore {
    /// Ensure the cache directory, database file and table exist.
    ///
    /// Safe to call on every startup; filesystem entries are only created the
    /// first time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created and
    /// [`StoreError::Database`] if the database cannot be opened or is not a
    /// SQLite file.
    pub fn initialize(location: &CacheLocation) -> StoreResult<Self> {
        let dir = location.dir();
        if dir.is_dir() {
            log::debug!("Image cache directory exists: {}", dir.display());
        } else {
            fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            log::info!("Created image cache directory: {}", dir.display());
        }

        let store = Self {
            db_path: location.db_path(),
        };
        let conn = store.connect()?;
        conn.execute_batch(CREATE_SCHEMA)?;
        log::debug!("Metadata store ready: {}", store.db_path.display());

        Ok(store)
    }

    /// Path of the backing SQLite file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> StoreResult<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Look up the record with the given content hash.
    ///
    /// # Arguments
    ///
    /// * `hash` - SHA-256 of the image bytes
    ///
    /// # Returns
    ///
    /// The matching record, or `Ok(None)` when no image with these bytes is
    /// cached. A miss is never an error.
    ///
    /// # Errors
    ///
    /// [`StoreError::Database`] if the database cannot be read, and
    /// [`StoreError::Corrupt`] if the stored row fails validation.
    pub fn find_by_hash(&self, hash: &ContentHash) -> StoreResult<Option<CacheRecord>> {
        let conn = self.connect()?;
        let raw = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE sha256 = ?1"),
                params![hash.as_str()],
                RawRecord::from_row,
            )
            .optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    /// Look up a record by id.
    pub fn get_by_id(&self, id: i64) -> StoreResult<Option<CacheRecord>> {
        let conn = self.connect()?;
        let raw = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                RawRecord::from_row,
            )
            .optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    /// Append a record and return its id.
    ///
    /// Callers check [`find_by_hash`](Self::find_by_hash) first. Inserting a
    /// hash that is already present violates the unique index and fails with
    /// [`StoreError::Database`].
    ///
    /// # Arguments
    ///
    /// * `title` - Picture title as published
    /// * `explanation` - Picture description as published
    /// * `file_path` - Absolute path of the stored image file
    /// * `hash` - SHA-256 of the bytes in `file_path`
    ///
    /// # Returns
    ///
    /// The new id. Ids increase and are never reused, even across restarts.
    ///
    /// # Errors
    ///
    /// [`StoreError::NonUtf8Path`] if `file_path` is not valid UTF-8, and
    /// [`StoreError::Database`] if the database is unwritable or the hash is
    /// already stored.
    pub fn insert(
        &self,
        title: &str,
        explanation: &str,
        file_path: &Path,
        hash: &ContentHash,
    ) -> StoreResult<i64> {
        let path_text = file_path
            .to_str()
            .ok_or_else(|| StoreError::NonUtf8Path(file_path.to_path_buf()))?;

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO image_apod (title, explanation, file_path, sha256) VALUES (?1, ?2, ?3, ?4)",
            params![title, explanation, path_text, hash.as_str()],
        )?;
        let id = conn.last_insert_rowid();
        log::debug!("Inserted record {} for {}", id, hash);
        Ok(id)
    }

    /// All records, oldest first.
    pub fn list(&self) -> StoreResult<Vec<CacheRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))?;
        let rows = stmt.query_map([], RawRecord::from_row)?;

        let mut records = Vec::new();
        for raw in rows {
            records.push(raw?.into_record()?);
        }
        Ok(records)
    }

    /// Titles of every cached image, oldest first.
    pub fn all_titles(&self) -> StoreResult<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT title FROM image_apod ORDER BY id")?;
        let titles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(titles)
    }

    /// Number of cached images.
    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM image_apod", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
