//! Persistent image cache storage.
//!
//! This module owns everything that is written to disk about a cached image
//! except the image bytes themselves.
//!
//! # Architecture
//!
//! * [`database`]: SQLite persistence, schema management, lookups and inserts.
//! * [`entry`]: The [`CacheRecord`] stored for each image.
//! * [`hash`]: SHA-256 [`ContentHash`], the deduplication key.
//! * [`location`]: Where the cache directory and database live.
//!
//! # Deduplication
//!
//! Records are keyed by the hash of the image bytes rather than by date or
//! title. Two dates that serve byte-identical images share one record and one
//! file.

pub mod database;
pub mod entry;
pub mod hash;
pub mod location;

pub use database::{MetadataStore, StoreError, StoreResult};
pub use entry::CacheRecord;
pub use hash::ContentHash;
pub use location::{CacheLocation, DB_FILE_NAME};
