//! Credential hashing.
//!
//! A stored verifier is `hex(SHA-256(FIXED_SALT || secret))`. The function is
//! pure and deterministic: the same secret always yields the same verifier.
//!
//! # Known limitation
//!
//! The salt is a single embedded constant shared by every account. That keeps
//! verifiers portable between deployments of this single-tenant core, but it
//! does not defend against precomputed tables the way per-account salts or a
//! memory-hard KDF would. Changing it changes every stored verifier.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Salt mixed into every credential before hashing.
pub const FIXED_SALT: &[u8] = b"bastion.credential.v1::4f1c9a62d3e8b07a";

/// Length of a verifier in hex characters.
pub const VERIFIER_LEN: usize = 64;

/// Hash a plaintext secret into its stored verifier.
pub fn hash_credential(secret: &str) -> String {
    let mut input = Zeroizing::new(Vec::with_capacity(FIXED_SALT.len() + secret.len()));
    input.extend_from_slice(FIXED_SALT);
    input.extend_from_slice(secret.as_bytes());

    let digest = Sha256::digest(input.as_slice());
    hex::encode(digest)
}

/// Check a plaintext secret against a stored verifier.
///
/// The comparison runs in time independent of where the first mismatch is.
pub fn verify_credential(secret: &str, verifier: &str) -> bool {
    let candidate = hash_credential(secret);
    constant_time_eq(candidate.as_bytes(), verifier.as_bytes())
}

/// Compare two byte strings without an early exit on the first difference.
///
/// Lengths are not secret here (verifiers and tokens are fixed-length), so a
/// length mismatch returns immediately.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
