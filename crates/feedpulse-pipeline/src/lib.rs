//! # FeedPulse Pipeline
//!
//! The extract, summarize, render and publish stages of the daily report.
//!
//! This crate owns the report message template, the publisher seam, and the
//! retrying stage runner that evaluates the run as a small DAG.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod pipeline;
pub mod publish;
pub mod stage;
pub mod summary;

pub use pipeline::*;
pub use publish::*;
pub use stage::*;
pub use summary::*;
