//! Structured error handling and exit codes.

use serde::Serialize;

use crate::manager::CacheError;

/// Exit codes for the apodcache application.
///
/// Code 2 is left to clap, which uses it for usage errors (including dates
/// rejected by the argument parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed.
    Success = 0,
    /// General error: configuration, I/O or anything not classified below.
    GeneralError = 1,
    /// The APOD service or the image download failed.
    RetrievalFailed = 3,
    /// The picture for the date is neither an image nor a video.
    UnsupportedMedia = 4,
    /// The metadata store or the image file could not be written.
    StoreFailed = 5,
    /// The image file name is taken by a different image.
    FileCollision = 6,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "AP000",
            Self::GeneralError => "AP001",
            Self::RetrievalFailed => "AP003",
            Self::UnsupportedMedia => "AP004",
            Self::StoreFailed => "AP005",
            Self::FileCollision => "AP006",
        }
    }

    /// Classify an application error by the cache failure it wraps, if any.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<CacheError>() {
            Some(CacheError::Retrieval(_)) => Self::RetrievalFailed,
            Some(CacheError::UnsupportedMedia(_)) => Self::UnsupportedMedia,
            Some(CacheError::Store(_)) => Self::StoreFailed,
            Some(CacheError::FileCollision { .. }) => Self::FileCollision,
            None => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "AP003")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
