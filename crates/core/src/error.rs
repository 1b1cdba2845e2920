//! Core error types

use thiserror::Error;

/// Core error type for Bastion
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected by validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[cfg(feature = "toml")]
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
