//! APOD date parsing.
//!
//! The service has published a picture every day since 1995-06-16. Dates
//! outside `1995-06-16 ..= today` are rejected before any request is made.

use chrono::{Local, NaiveDate};
use thiserror::Error;

/// Errors for user-supplied dates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    Invalid(String),

    #[error("date {0} is before the first APOD ({first})", first = first_apod_date())]
    TooEarly(NaiveDate),

    #[error("date {0} is in the future")]
    InFuture(NaiveDate),
}

/// Date of the first Astronomy Picture of the Day.
#[must_use]
pub fn first_apod_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 6, 16).unwrap_or(NaiveDate::MIN)
}

/// Check that `date` falls within `first_apod_date() ..= today`.
pub fn validate_apod_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, DateError> {
    if date < first_apod_date() {
        return Err(DateError::TooEarly(date));
    }
    if date > today {
        return Err(DateError::InFuture(date));
    }
    Ok(date)
}

/// Parse a `YYYY-MM-DD` date and validate it against the local date.
///
/// Usable directly as a clap `value_parser`.
///
/// # Examples
///
/// ```
/// use apodcache::apod::parse_apod_date;
///
/// assert!(parse_apod_date("2022-05-01").is_ok());
/// assert!(parse_apod_date("1990-01-01").is_err());
/// assert!(parse_apod_date("May 1st").is_err());
/// ```
pub fn parse_apod_date(s: &str) -> Result<NaiveDate, DateError> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| DateError::Invalid(s.to_string()))?;
    validate_apod_date(date, Local::now().date_naive())
}
