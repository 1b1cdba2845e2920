//! Credential and token primitives for Bastion.
//!
//! # Core Capabilities
//!
//! - **Credential Hashing**: deterministic verifiers for stored secrets
//! - **Session Tokens**: 256-bit tokens from the OS CSPRNG
//! - **Comparison**: constant-time equality for verifiers and tokens
//!
//! # Security Principles
//!
//! - Secrets and tokens are never logged (use [`token_fingerprint`])
//! - Intermediate secret buffers are zeroized
//! - Entropy failure is the one hard error; it is never swallowed

pub mod error;
pub mod hasher;
pub mod token;

pub use error::{CryptoError, CryptoResult};
pub use hasher::{constant_time_eq, hash_credential, verify_credential, FIXED_SALT, VERIFIER_LEN};
pub use token::{check_token_format, generate_token, token_fingerprint, TOKEN_BYTES, TOKEN_HEX_LEN};
