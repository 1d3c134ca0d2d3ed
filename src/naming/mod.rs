//! Slot naming and the filename boundary
//!
//! Every caller-supplied identifier passes through [`FilenameGuard`] before it
//! is joined to a filesystem path. A name that fails the guard never reaches
//! the filesystem.
//!
//! # Grammar
//!
//! - First character ASCII alphanumeric
//! - Remaining characters from `[A-Za-z0-9_. -]`
//! - Mandatory kind suffix (`.a7p` for profiles, `.tar` for archives)
//! - Lexically canonical: exactly one plain path component

mod errors;
mod guard;

pub use errors::{FilenameError, FilenameResult};
pub use guard::{DocumentKind, DocumentName, FilenameGuard};
