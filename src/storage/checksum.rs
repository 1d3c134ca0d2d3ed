//! Record checksum computation
//!
//! - Fixed-width: 32 lowercase hex characters
//! - Deterministic: the same content always yields the same prefix
//! - MD5 digest, used for corruption detection only. Collision resistance
//!   is not a requirement; MD5 keeps records byte-compatible with the
//!   `.a7p` files already present on devices.

use md5::{Digest, Md5};

/// Width of the hex checksum prefix in bytes.
pub const CHECKSUM_WIDTH: usize = 32;

/// Computes the hex checksum over the provided content.
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Verifies that `prefix` is the checksum of `content`.
pub fn verify_checksum(content: &[u8], prefix: &[u8]) -> bool {
    compute_checksum(content).as_bytes() == prefix
}
