//! Integrity errors
//!
//! Both variants mean the stored bytes are corrupt. The client never
//! controlled those bytes, so the gateway reports them as server errors.

use thiserror::Error;

/// Result type for integrity operations
pub type IntegrityResult<T> = Result<T, IntegrityError>;

/// Stored record failed its integrity check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// The record cannot even hold a checksum plus one content byte.
    #[error("record too short for a checksum: {len} bytes")]
    TooShort { len: usize },

    /// The recomputed checksum disagrees with the stored prefix.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}
