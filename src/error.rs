//! Error types for the calendar engine.

use thiserror::Error;

/// Errors raised inside the calendar engine.
///
/// None of these reach the clock driver: the engine converts them into a
/// degraded status (stale calendar data or the solar fallback).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Network, HTTP status or body decoding failure on the calendar fetch.
    #[error("Calendar feed unavailable: {0}")]
    FeedUnavailable(String),

    /// A feed item whose date string cannot be parsed.
    #[error("Malformed event '{title}': unparseable date '{date}'")]
    MalformedEvent { title: String, date: String },

    #[error("Invalid coordinates: lat={lat:.4}, lon={lon:.4}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    /// A wall time that does not exist (or exists twice) in the configured timezone.
    #[error("Ambiguous or invalid local time: {0}")]
    AmbiguousLocalTime(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::FeedUnavailable(err.to_string())
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
