//! Collection of common cryptography primitives used when binding messages together.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 of the given `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compare a received digest against the SHA-256 of `data` without short-circuiting on the first
/// differing byte.
pub fn sha256_matches(data: &[u8], digest: &[u8]) -> bool {
    let expected = sha256(data);
    expected.len() == digest.len()
        && expected
            .iter()
            .zip(digest)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
