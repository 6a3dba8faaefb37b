//! Error types for analytics, selection validation and the API client.
//!
//! Command plumbing uses `anyhow`; these typed errors are what the
//! library-style modules return so callers can match on them.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised by the aggregation functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// Summary statistics need at least one reading.
    #[error("no readings to analyze")]
    EmptyInput,
}

/// Errors raised while validating a city/date-range selection.
///
/// These are always reported before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Please select a city")]
    MissingCity,

    #[error("Please select both start and end dates (missing {0} date)")]
    MissingDate(&'static str),

    #[error("Invalid date '{0}': expected YYYY-MM-DD, YYYY-MM-DDTHH:MM or YYYY-MM-DDTHH:MM:SS")]
    InvalidDate(String),

    #[error("Start date must be before end date ({start} >= {end})")]
    InvertedRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Date range cannot exceed {max} days (requested {days})")]
    RangeTooLong { days: i64, max: i64 },
}

/// Errors raised by the AirSight API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to AirSight API at {0}. Is the server running?")]
    Connect(String),

    #[error("AirSight API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AirSight API rejected the request: {0}")]
    Rejected(String),

    /// The server answered but reported no usable data.
    #[error("No historical data: {0}")]
    NoData(String),

    #[error("Failed to parse AirSight API response: {0}")]
    Decode(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to send request: {0}")]
    Transport(#[source] reqwest::Error),
}

impl ApiError {
    /// Classify a reqwest failure the way users need to see it.
    pub fn from_reqwest(err: reqwest::Error, base_url: &str, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout_seconds)
        } else if err.is_connect() {
            ApiError::Connect(base_url.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_messages() {
        assert_eq!(SelectionError::MissingCity.to_string(), "Please select a city");
        assert!(SelectionError::MissingDate("end")
            .to_string()
            .contains("missing end date"));

        let err = SelectionError::RangeTooLong {
            days: 2000,
            max: 1095,
        };
        assert_eq!(
            err.to_string(),
            "Date range cannot exceed 1095 days (requested 2000)"
        );
    }

    #[test]
    fn test_api_error_messages() {
        assert_eq!(
            ApiError::Timeout(30).to_string(),
            "Request timed out after 30s"
        );
        let err = ApiError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "AirSight API error 500: boom");
        assert_eq!(
            ApiError::NoData("No data found for city".to_string()).to_string(),
            "No historical data: No data found for city"
        );
    }
}
