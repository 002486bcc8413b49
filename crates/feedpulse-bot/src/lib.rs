//! # FeedPulse Bot
//!
//! Scheduled daily product-metrics report delivered to Telegram.
//!
//! This is the main binary crate that wires the ClickHouse extractor, chart
//! renderer and Telegram publisher into a cron-triggered pipeline.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod error;
pub mod scheduler;
pub mod telegram;

pub use bot::*;
pub use error::*;
pub use scheduler::*;
pub use telegram::*;
