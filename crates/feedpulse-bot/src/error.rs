//! Application-wide error types using thiserror.

use feedpulse_common::ReportError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Failure inside the report pipeline or its configuration.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Cron scheduler error.
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    pub fn scheduler(err: impl std::fmt::Display) -> Self {
        Self::Scheduler(err.to_string())
    }
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;
