//! Core module - configuration, error types and logging setup
//!
//! Everything here runs once at process startup:
//!
//! - [`logging::init`] installs the `tracing` subscriber
//! - [`AiConfig::from_env`] reads and validates the inference endpoint settings
//!
//! The resulting [`AiConfig`] is handed to [`crate::ai::MoveAcquirer`]; no other
//! module reads the environment.

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used items
pub use config::{AiConfig, Provider, Sampling};
pub use error::{ConfigError, ConfigResult};
