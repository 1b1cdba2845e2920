//! Error types for credential and token primitives.

use thiserror::Error;

/// Failures of the cryptographic environment.
///
/// These are fatal for the operation that hit them: without a working entropy
/// source no session can be issued safely.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Malformed session token: {0}")]
    MalformedToken(String),
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
