use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid input for {url}: {reason}")]
    InvalidInput { url: String, reason: String },

    #[error("product page not found: {url}")]
    NotFound { url: String },

    #[error(
        "rate limited fetching {url}{}",
        .retry_after_secs.map_or_else(String::new, |s| format!(" (retry after {s}s)"))
    )]
    RateLimited {
        url: String,
        retry_after_secs: Option<u64>,
    },

    #[error("access forbidden for {url} (HTTP 403, suspected bot detection)")]
    Forbidden { url: String },

    #[error("service unavailable for {url}: {reason}")]
    ServiceUnavailable { url: String, reason: String },

    #[error("timed out fetching {url} after {attempts} attempt(s)")]
    Timeout { url: String, attempts: u32 },

    #[error("fetch failed for {url} after {attempts} attempt(s)")]
    FetchFailed { url: String, attempts: u32 },

    #[error("mandatory field \"{field}\" missing from {url}")]
    FieldMissing { field: &'static str, url: String },

    #[error("extracted record is invalid: {reason}")]
    InvalidRecord { reason: String },

    #[error("render fallback failed for {url}: {reason}")]
    RenderFailed { url: String, reason: String },
}

/// Coarse classification of a [`ScraperError`], used for batch reporting
/// and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    RateLimited,
    Forbidden,
    ServiceUnavailable,
    Timeout,
    FetchFailed,
    FieldMissing,
    InvalidRecord,
    RenderFailed,
    Http,
}

impl ScraperError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) => ErrorKind::Http,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::FetchFailed { .. } => ErrorKind::FetchFailed,
            Self::FieldMissing { .. } => ErrorKind::FieldMissing,
            Self::InvalidRecord { .. } => ErrorKind::InvalidRecord,
            Self::RenderFailed { .. } => ErrorKind::RenderFailed,
        }
    }

    /// Returns `true` for classifications where retrying is known to be
    /// useless within a single fetch call (404, malformed input, and
    /// post-fetch extraction failures — static markup does not change
    /// between attempts).
    #[must_use]
    pub fn is_fail_fast(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidInput
                | ErrorKind::NotFound
                | ErrorKind::FieldMissing
                | ErrorKind::InvalidRecord
        )
    }
}
