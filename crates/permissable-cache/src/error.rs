//! Error types for cache operations
//!
//! Cache failures never reach permission callers: stores log them and
//! report the failure sentinel instead. These types cover the places where
//! a caller does want to know, such as opening a backend or loading config.

use thiserror::Error;

/// Cache error types.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Could not connect to the backing store
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Store was requested but is not available in this build
    #[error("Unsupported store backend: {0}")]
    Unsupported(String),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

impl CacheError {
    /// Whether retrying the same operation later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CacheError::ConnectionError(_))
    }
}
