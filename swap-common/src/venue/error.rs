//! Venue error types with classification for retry logic.

use std::time::Duration;
use thiserror::Error;

use crate::error::{ErrorCategory, ErrorClassification};

/// Result type for venue operations.
pub type VenueResult<T> = Result<T, VenueError>;

/// Errors that can occur talking to an exchange.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum VenueError {
    /// Connection error (TCP, TLS, DNS)
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP request failed before a response arrived
    #[error("Request error: {0}")]
    Request(String),

    /// The venue answered with a non-success envelope or status
    #[error("Venue API error: {message}")]
    Api {
        /// HTTP status, when available
        status: Option<u16>,
        /// Venue-provided message
        message: String,
    },

    /// Order was rejected by the venue
    #[error("Order rejected: {reason}")]
    OrderRejected { reason: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Operation timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Failed to parse a venue response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client misconfiguration (bad base URL, missing credentials)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl VenueError {
    /// Create an API error from an HTTP status and message.
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an order-rejected error.
    pub fn order_rejected(reason: impl Into<String>) -> Self {
        Self::OrderRejected {
            reason: reason.into(),
        }
    }
}

impl ErrorClassification for VenueError {
    fn category(&self) -> ErrorCategory {
        match self {
            VenueError::Connection(_) => ErrorCategory::Transient,
            VenueError::Request(_) => ErrorCategory::Transient,
            VenueError::Timeout(_) => ErrorCategory::Transient,
            VenueError::RateLimit => ErrorCategory::ResourceExhausted,
            VenueError::Api { status, .. } => match status {
                Some(s) if *s >= 500 => ErrorCategory::Transient,
                _ => ErrorCategory::Permanent,
            },
            VenueError::OrderRejected { .. } => ErrorCategory::Permanent,
            VenueError::Parse(_) => ErrorCategory::Permanent,
            VenueError::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            VenueError::RateLimit => Some(Duration::from_secs(60)),
            VenueError::Connection(_) => Some(Duration::from_secs(1)),
            VenueError::Timeout(_) => Some(Duration::from_millis(500)),
            VenueError::Request(_) => Some(Duration::from_millis(100)),
            VenueError::Api { status: Some(s), .. } if *s >= 500 => {
                Some(Duration::from_millis(500))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_error_classification() {
        let err = VenueError::Connection("refused".to_string());
        assert!(err.is_transient());
        assert!(err.suggested_retry_delay().is_some());

        let err = VenueError::order_rejected("insufficient balance");
        assert!(err.is_permanent());
        assert!(err.suggested_retry_delay().is_none());
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err = VenueError::api(Some(503), "maintenance");
        assert!(err.is_transient());

        let err = VenueError::api(Some(400), "bad symbol");
        assert!(err.is_permanent());

        let err = VenueError::api(None, "success=false");
        assert!(err.is_permanent());
    }
}
