//! # FeedPulse Common
//!
//! Shared types, utilities, and common functionality for FeedPulse.
//!
//! This crate provides the error taxonomy, the daily metric series model,
//! logging setup and the ClickHouse extractor used across the workspace.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;
pub mod warehouse;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

// Re-export commonly used types
pub use error::{ReportError, Result};
pub use logging::{init_default_logging, init_logging, LogFormat, LoggingConfig};
pub use types::*;
pub use utils::*;
pub use warehouse::{metric_query, ClickHouseSource, MetricSource, WarehouseConfig};
