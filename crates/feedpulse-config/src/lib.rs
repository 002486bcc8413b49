//! # FeedPulse Config
//!
//! Type-safe configuration management for FeedPulse.
//!
//! This crate provides the configuration schema with defaults, YAML loading
//! with environment overrides, and validation run before the first report.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validation;

pub use defaults::*;
pub use loader::*;
pub use schema::*;
pub use validation::ConfigValidator;
