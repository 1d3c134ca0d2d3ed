//! Integrity codec
//!
//! On-disk record layout:
//!
//! ```text
//! +----------------------------+------------------+
//! | checksum (32 hex chars)    | content (raw)    |
//! +----------------------------+------------------+
//! ```
//!
//! `checksum == compute_checksum(content)`. A record of `CHECKSUM_WIDTH`
//! bytes or fewer is never valid.

use super::checksum::{compute_checksum, verify_checksum, CHECKSUM_WIDTH};
use super::errors::{IntegrityError, IntegrityResult};

/// Wraps and unwraps stored records. Stateless.
pub struct IntegrityCodec;

impl IntegrityCodec {
    /// Prepends the checksum of `content`.
    pub fn wrap(content: &[u8]) -> Vec<u8> {
        let mut record = Vec::with_capacity(CHECKSUM_WIDTH + content.len());
        record.extend_from_slice(compute_checksum(content).as_bytes());
        record.extend_from_slice(content);
        record
    }

    /// Verifies `stored` and returns its content segment unchanged.
    ///
    /// # Errors
    ///
    /// - `TooShort` if `stored.len() <= CHECKSUM_WIDTH`
    /// - `ChecksumMismatch` if the prefix is not the checksum of the rest
    pub fn unwrap(stored: &[u8]) -> IntegrityResult<&[u8]> {
        if stored.len() <= CHECKSUM_WIDTH {
            return Err(IntegrityError::TooShort { len: stored.len() });
        }

        let (prefix, content) = stored.split_at(CHECKSUM_WIDTH);
        if !verify_checksum(content, prefix) {
            return Err(IntegrityError::ChecksumMismatch {
                expected: compute_checksum(content),
                actual: String::from_utf8_lossy(prefix).into_owned(),
            });
        }

        Ok(content)
    }
}
