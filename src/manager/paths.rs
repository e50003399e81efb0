//! File name derivation for cached images.
//!
//! Everything here is pure: no disk or network access, same inputs always
//! give the same path.
//!
//! # Example
//!
//! ```
//! use apodcache::manager::derive_path;
//! use std::path::Path;
//!
//! let path = derive_path(
//!     Path::new("/cache"),
//!     "  NGC #3521: Galaxy in a Bubble  ",
//!     "https://apod.nasa.gov/apod/image/2205/NGC3521LRGBHaAPOD-20.jpg",
//! );
//! assert!(path.ends_with("NGC_3521_Galaxy_in_a_Bubble.jpg"));
//! ```

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

use crate::cache::ContentHash;

/// Stem used when a title normalizes to nothing.
pub const FALLBACK_STEM: &str = "apod";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid character class regex"));

/// Turn a title into a file stem.
///
/// Trims, collapses each whitespace run into `_`, then drops every character
/// outside `[A-Za-z0-9_]`.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let underscored = WHITESPACE_RUN.replace_all(title.trim(), "_");
    let stem = DISALLOWED.replace_all(&underscored, "");
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem.into_owned()
    }
}

/// Extension of the last segment of a URL's path, without the dot.
///
/// Query strings and fragments are ignored. Returns `None` when the last
/// segment has no `.` or nothing follows it.
#[must_use]
pub fn url_extension(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Not absolute: treat the input itself as a path
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let segment = path.rsplit('/').next().unwrap_or_default();
    let (_, ext) = segment.rsplit_once('.')?;
    let ext: String = ext.chars().filter(char::is_ascii_alphanumeric).collect();
    (!ext.is_empty()).then_some(ext)
}

fn compose(cache_dir: &Path, stem: &str, url: &str) -> PathBuf {
    match url_extension(url) {
        Some(ext) => cache_dir.join(format!("{stem}.{ext}")),
        None => cache_dir.join(stem),
    }
}

/// Destination of an image inside `cache_dir`: `<normalized title>.<ext>`.
///
/// Pure: the same inputs always give the same path, and nothing on disk is
/// consulted.
///
/// # Arguments
///
/// * `cache_dir` - Directory holding the cached images
/// * `title` - Picture title, normalized with [`normalize_title`]
/// * `url` - Download URL; its last path segment supplies the extension
///
/// # Example
///
/// ```
/// use apodcache::manager::derive_path;
/// use std::path::Path;
///
/// let path = derive_path(
///     Path::new("/cache"),
///     "  NGC #3521: Galaxy in a Bubble  ",
///     "https://apod.nasa.gov/apod/image/2205/NGC3521LRGBHaAPOD-20.jpg",
/// );
/// assert_eq!(path, Path::new("/cache/NGC_3521_Galaxy_in_a_Bubble.jpg"));
/// ```
#[must_use]
pub fn derive_path(cache_dir: &Path, title: &str, url: &str) -> PathBuf {
    compose(cache_dir, &normalize_title(title), url)
}

/// Like [`derive_path`] with a short hash suffix on the stem.
///
/// Used when a different image already occupies the plain name.
#[must_use]
pub fn derive_qualified_path(
    cache_dir: &Path,
    title: &str,
    url: &str,
    hash: &ContentHash,
) -> PathBuf {
    let stem = format!("{}_{}", normalize_title(title), hash.short());
    compose(cache_dir, &stem, url)
}
