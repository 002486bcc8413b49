//! # FeedPulse Graphs
//!
//! Week-over-week trend charts for the daily product metrics report.
//!
//! This crate separates the pure preparation of plotted values from native
//! Rust rendering using plotters.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod renderer;
pub mod traits;
pub mod trends;
pub mod utils;

pub use renderer::*;
pub use traits::*;
pub use trends::*;
pub use utils::*;
