//! Error types for identity operations.
//!
//! Policy outcomes (bad password, locked account, expired session) are never
//! errors; they come back as `bool`, `Option` or a rejection enum. What lands
//! here is the environment failing underneath the policy.

use thiserror::Error;

use bastion_crypto::CryptoError;

/// Failures reported by a user directory implementation.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Account not found
    #[error("Account not found: {account_id}")]
    NotFound { account_id: String },

    /// Identifier or username already taken
    #[error("Account already exists: {0}")]
    Duplicate(String),

    /// Backing store could not be reached
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur in identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Cryptographic environment failure (fatal for the operation)
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    /// Directory read/write failure
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Invalid security configuration
    #[error("Configuration error: {0}")]
    Config(#[from] bastion_core::Error),
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
