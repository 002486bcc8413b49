//! Error types and utilities for FeedPulse

use thiserror::Error;

/// Result type alias for FeedPulse operations
pub type Result<T> = std::result::Result<T, ReportError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the report pipeline
#[derive(Error, Debug)]
pub enum ReportError {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Query execution or connection failure against the data store
    #[error("Data access error: {message}")]
    DataAccess {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// An extracted series had no rows, so the latest day is undefined
    #[error("Empty result: no rows returned for {metric}")]
    EmptyResult { metric: String },

    /// The four series of a run do not cover the same days
    #[error("Misaligned series: {message}")]
    Misaligned { message: String },

    /// Chart drawing or image encoding failure
    #[error("Render error: {message}")]
    Render {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The messaging endpoint rejected the send
    #[error("Delivery error: {message}")]
    Delivery {
        message: String,
        error_code: Option<u16>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReportError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new data access error
    pub fn data_access(msg: impl Into<String>) -> Self {
        Self::DataAccess {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new data access error with source
    pub fn data_access_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DataAccess {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an empty result error for the named metric
    pub fn empty_result(metric: impl Into<String>) -> Self {
        Self::EmptyResult {
            metric: metric.into(),
        }
    }

    /// Create a new misalignment error
    pub fn misaligned(msg: impl Into<String>) -> Self {
        Self::Misaligned {
            message: msg.into(),
        }
    }

    /// Create a new render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new render error with source
    pub fn render_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Render {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new delivery error
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery {
            message: msg.into(),
            error_code: None,
            source: None,
        }
    }

    /// Create a new delivery error carrying the API error code
    pub fn delivery_with_code(msg: impl Into<String>, code: u16) -> Self {
        Self::Delivery {
            message: msg.into(),
            error_code: Some(code),
            source: None,
        }
    }

    /// Create a new delivery error with source
    pub fn delivery_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Delivery {
            message: msg.into(),
            error_code: None,
            source: Some(Box::new(source)),
        }
    }

    /// Whether the stage runner should attempt the failed stage again.
    ///
    /// Configuration problems and inconsistent series do not go away between
    /// attempts; everything else is retried uniformly.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Config { .. } | Self::Misaligned { .. })
    }
}

// Error conversion implementations for external types

/// Convert from reqwest::Error to ReportError
impl From<reqwest::Error> for ReportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::delivery_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::delivery_with_source("Connection failed", err)
        } else if err.is_status() {
            let status_code = err.status().map(|s| s.as_u16()).unwrap_or(0);
            Self::Delivery {
                message: format!("HTTP error: {}", status_code),
                error_code: Some(status_code),
                source: Some(Box::new(err)),
            }
        } else {
            Self::delivery_with_source("Network request failed", err)
        }
    }
}

#[cfg(feature = "plotters")]
/// Convert from plotters drawing errors to ReportError
impl<T> From<plotters::drawing::DrawingAreaErrorKind<T>> for ReportError
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<T>) -> Self {
        Self::render_with_source("Chart rendering failed", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{error::Error, io};

    #[test]
    fn test_error_creation() {
        let config_error = ReportError::config("missing token");
        assert_eq!(config_error.to_string(), "Configuration error: missing token");

        let empty = ReportError::empty_result("active_users");
        assert_eq!(
            empty.to_string(),
            "Empty result: no rows returned for active_users"
        );

        let delivery = ReportError::delivery_with_code("Unauthorized", 401);
        assert!(delivery.to_string().contains("Delivery error"));
        assert!(matches!(
            delivery,
            ReportError::Delivery {
                error_code: Some(401),
                ..
            }
        ));
    }

    #[test]
    fn test_error_with_source() {
        let wrapped = ReportError::data_access_with_source(
            "connection refused",
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );

        assert!(wrapped.to_string().contains("Data access error"));
        assert!(wrapped.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let report_error: ReportError = io_error.into();

        assert!(report_error.to_string().contains("I/O error"));
        assert!(report_error.source().is_some());
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_error = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let report_error: ReportError = serde_error.into();

        assert!(report_error.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_retry_classification() {
        assert!(!ReportError::config("bad").is_retryable());
        assert!(ReportError::data_access("down").is_retryable());
        assert!(ReportError::empty_result("views").is_retryable());
        assert!(!ReportError::misaligned("gap").is_retryable());
        assert!(ReportError::render("font").is_retryable());
        assert!(ReportError::delivery("rejected").is_retryable());
    }
}
