//! Random value generation for challenges, correlators and identifiers.

use rand::RngCore;

use super::encoding;

fn random_fill(buffer: &mut [u8]) {
    let mut random = rand::thread_rng();
    random.fill_bytes(buffer);
}

/// Generate random data of specific length.
pub fn random_vec(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    random_fill(&mut data);
    data
}

/// Generate `len` random bytes and encode them as unpadded `base64url`.
pub fn random_base64url(len: usize) -> String {
    encoding::base64url(&random_vec(len))
}

/// Generate `len` random bytes and encode them as lowercase hex.
pub fn random_hex(len: usize) -> String {
    encoding::hex(&random_vec(len))
}
