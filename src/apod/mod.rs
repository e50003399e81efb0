//! Astronomy Picture of the Day retrieval.
//!
//! The image cache talks to the outside world only through the [`Retrieval`]
//! trait: "given a date, describe the picture" and "given a URL, return its
//! bytes". [`ApodClient`] is the HTTP implementation against NASA's API;
//! tests substitute their own.
//!
//! # Architecture
//!
//! * [`client`]: Blocking HTTP client for the APOD API.
//! * [`date`]: Parsing and range validation of APOD dates.

pub mod client;
pub mod date;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use client::ApodClient;
pub use date::{first_apod_date, parse_apod_date, validate_apod_date, DateError};

/// Errors from the remote service.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The request never produced an HTTP response (DNS, TLS, connection, timeout).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("request to {url} returned status {code}: {body}")]
    Status { url: String, code: u16, body: String },

    /// The response could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A URL could not be built or parsed.
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Kind of media the APOD service published for a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    /// Anything else the service reports; the cache refuses these.
    Other(String),
}

impl MediaKind {
    /// Classify the service's `media_type` field.
    #[must_use]
    pub fn from_media_type(s: &str) -> Self {
        match s {
            "image" => Self::Image,
            "video" => Self::Video,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// Description of one day's picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Date the picture was published for.
    pub date: NaiveDate,
    pub title: String,
    pub explanation: String,
    pub media_kind: MediaKind,
    /// High-resolution image URL (images only).
    pub image_url: Option<String>,
    /// Thumbnail URL (videos only).
    pub video_url: Option<String>,
    pub copyright: Option<String>,
}

/// Source of APOD metadata and image bytes.
pub trait Retrieval {
    /// Fetch the metadata published for `date`.
    fn fetch_metadata(&self, date: NaiveDate) -> Result<MediaMetadata, RetrievalError>;

    /// Download the raw bytes behind `url`.
    fn download(&self, url: &str) -> Result<Vec<u8>, RetrievalError>;
}

impl<R: Retrieval + ?Sized> Retrieval for &R {
    fn fetch_metadata(&self, date: NaiveDate) -> Result<MediaMetadata, RetrievalError> {
        (**self).fetch_metadata(date)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, RetrievalError> {
        (**self).download(url)
    }
}
