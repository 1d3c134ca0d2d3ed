//! Record integrity for stored documents
//!
//! Every byte written to a slot is wrapped by [`IntegrityCodec::wrap`] and
//! every byte read back is verified by [`IntegrityCodec::unwrap`] before
//! anything else looks at it.
//!
//! # Invariants
//!
//! - Checksum on every record
//! - Corruption is never ignored: a mismatch aborts the read
//! - Records are rewritten whole, never patched

mod checksum;
mod codec;
mod errors;

pub use checksum::{compute_checksum, verify_checksum, CHECKSUM_WIDTH};
pub use codec::IntegrityCodec;
pub use errors::{IntegrityError, IntegrityResult};
