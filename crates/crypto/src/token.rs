//! Session token generation.
//!
//! Tokens are 32 bytes from the operating system CSPRNG, hex encoded. The raw
//! bytes are wiped as soon as the encoded form exists.

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::error;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};

/// Random bytes per token.
pub const TOKEN_BYTES: usize = 32;

/// Length of an encoded token.
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;

/// Generate a fresh, unguessable session token.
///
/// Fails only when the OS entropy source is unavailable.
pub fn generate_token() -> CryptoResult<String> {
    let mut raw = Zeroizing::new([0u8; TOKEN_BYTES]);
    OsRng
        .try_fill_bytes(raw.as_mut_slice())
        .map_err(|e| {
            error!(error = %e, "OS entropy source unavailable, refusing to issue token");
            CryptoError::EntropyUnavailable(e.to_string())
        })?;
    Ok(hex::encode(raw.as_slice()))
}

/// Reject strings that cannot be a token before touching any table.
pub fn check_token_format(token: &str) -> CryptoResult<()> {
    if token.len() != TOKEN_HEX_LEN {
        return Err(CryptoError::MalformedToken(format!(
            "expected {} hex characters, got {}",
            TOKEN_HEX_LEN,
            token.len()
        )));
    }
    if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CryptoError::MalformedToken(
            "token contains non-hex characters".to_string(),
        ));
    }
    Ok(())
}

/// Short, non-reversible prefix for log lines.
pub fn token_fingerprint(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map(|(idx, _)| idx)
        .unwrap_or(token.len());
    &token[..end]
}
