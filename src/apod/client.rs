//! Blocking HTTP client for NASA's APOD API.

use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;
use url::Url;

use super::{MediaKind, MediaMetadata, Retrieval, RetrievalError};

/// Default APOD API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.nasa.gov/planetary/apod";

/// NASA's shared, rate-limited demonstration key.
pub const DEMO_API_KEY: &str = "DEMO_KEY";

/// JSON payload returned by the APOD API for a single date.
#[derive(Debug, Deserialize)]
pub(crate) struct ApodResponse {
    date: Option<String>,
    title: Option<String>,
    explanation: Option<String>,
    media_type: String,
    url: Option<String>,
    hdurl: Option<String>,
    thumbnail_url: Option<String>,
    copyright: Option<String>,
}

impl ApodResponse {
    /// Validate the payload and map it to [`MediaMetadata`].
    ///
    /// Images prefer `hdurl` and fall back to `url`. Videos use
    /// `thumbnail_url`, which the API only sends when `thumbs=true`.
    pub(crate) fn into_metadata(self, requested: NaiveDate) -> Result<MediaMetadata, RetrievalError> {
        let title = non_empty(self.title, "title")?;
        let explanation = non_empty(self.explanation, "explanation")?;

        let date = match self.date.as_deref() {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| RetrievalError::Malformed(format!("invalid date '{s}'")))?,
            None => requested,
        };

        let media_kind = MediaKind::from_media_type(&self.media_type);
        let image_url = match media_kind {
            MediaKind::Image => self.hdurl.or(self.url),
            _ => self.hdurl,
        };

        Ok(MediaMetadata {
            date,
            title,
            explanation,
            media_kind,
            image_url,
            video_url: self.thumbnail_url,
            copyright: self.copyright.map(|c| c.trim().to_string()),
        })
    }
}

fn non_empty(value: Option<String>, field: &str) -> Result<String, RetrievalError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RetrievalError::Malformed(format!(
            "missing or empty '{field}'"
        ))),
    }
}

/// HTTP implementation of [`Retrieval`].
pub struct ApodClient {
    agent: ureq::Agent,
    api_url: Url,
    api_key: String,
}

impl ApodClient {
    /// Build a client for `api_url` authenticating with `api_key`.
    ///
    /// `timeout` bounds connect, read and write separately; `None` leaves
    /// requests unbounded.
    pub fn new(
        api_url: &str,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RetrievalError> {
        let api_url = Url::parse(api_url).map_err(|err| RetrievalError::InvalidUrl {
            url: api_url.to_string(),
            message: err.to_string(),
        })?;

        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder
                .timeout_connect(timeout)
                .timeout_read(timeout)
                .timeout_write(timeout);
        }

        Ok(Self {
            agent: builder.build(),
            api_url,
            api_key: api_key.into(),
        })
    }

    /// Request URL for a date's metadata.
    pub(crate) fn metadata_url(&self, date: NaiveDate) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("date", &date.format("%Y-%m-%d").to_string())
            .append_pair("thumbs", "true");
        url
    }

    fn get(&self, url: &str) -> Result<ureq::Response, RetrievalError> {
        match self.agent.get(url).call() {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(code, resp)) => Err(RetrievalError::Status {
                url: redact_key(url),
                code,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(err) => Err(RetrievalError::Transport {
                url: redact_key(url),
                message: err.to_string(),
            }),
        }
    }
}

impl Retrieval for ApodClient {
    fn fetch_metadata(&self, date: NaiveDate) -> Result<MediaMetadata, RetrievalError> {
        let url = self.metadata_url(date);
        log::debug!("Requesting APOD metadata for {}", date);

        let response = self.get(url.as_str())?;
        let payload: ApodResponse = response.into_json().map_err(|err| {
            RetrievalError::Malformed(format!("failed to parse APOD response: {err}"))
        })?;
        payload.into_metadata(date)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, RetrievalError> {
        Url::parse(url).map_err(|err| RetrievalError::InvalidUrl {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        log::debug!("Downloading {}", url);

        let response = self.get(url)?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|err| RetrievalError::Transport {
                url: url.to_string(),
                message: format!("failed reading response body: {err}"),
            })?;

        if bytes.is_empty() {
            return Err(RetrievalError::Malformed(format!("empty body from {url}")));
        }
        Ok(bytes)
    }
}

/// Strip the `api_key` query parameter so keys never reach logs or errors.
fn redact_key(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "api_key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        return url.to_string();
    }
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}
