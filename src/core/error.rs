//! Error types for core module
//!
//! Configuration is validated once at startup; everything that can go wrong
//! while reading or checking it ends up in [`ConfigError`].

use crate::core::config::Provider;
use thiserror::Error;

/// Errors that can occur while building or validating configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The selected provider needs an API key and none was configured
    #[error("{provider} API key is not configured. Set it in the {var} environment variable")]
    MissingApiKey {
        provider: Provider,
        var: &'static str,
    },

    /// A variable was present but could not be parsed
    #[error("invalid value for {var} ({value:?}): {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// The assembled configuration violates an invariant
    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
