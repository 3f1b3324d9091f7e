//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("Socket path must start with '/'")]
    InvalidSocketPath,

    #[error("{0} must be greater than zero")]
    ZeroCapacity(&'static str),

    #[error("Token parameter name cannot be empty")]
    EmptyTokenParam,

    #[error("Invalid token entry '{0}', expected token=userId")]
    InvalidTokenEntry(String),

    #[error("No identity tokens configured")]
    NoTokensConfigured,
}
