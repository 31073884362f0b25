//! Error types for Festify.

use std::time::Duration;

use thiserror::Error;

/// Main error type for all Festify operations.
#[derive(Debug, Error)]
pub enum FestifyError {
    /// Missing or invalid credentials / settings. Fatal before any API call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Lineup file missing, unreadable or malformed.
    #[error("Lineup error: {0}")]
    Lineup(String),

    /// No lineup source is registered for the festival key.
    #[error("Unknown festival: {0}")]
    UnknownFestival(String),

    /// The Web API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Too many requests - rate limited.
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// No data returned from API.
    #[error("No data from API: {0}")]
    NoData(String),

    /// HTTP request failed.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Settings file could not be parsed.
    #[error("Settings error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FestifyError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FestifyError::RateLimited { .. } => true,
            FestifyError::Api { status, .. } => *status >= 500,
            FestifyError::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Whether the failed request certainly never reached the server, so
    /// even a non-idempotent request may be sent again.
    pub fn is_unsent(&self) -> bool {
        match self {
            FestifyError::RateLimited { .. } => true,
            FestifyError::Request(e) => e.is_connect(),
            _ => false,
        }
    }
}

/// Result type alias for Festify operations.
pub type Result<T> = std::result::Result<T, FestifyError>;
