//! Filename rejection errors

use thiserror::Error;

use super::guard::DocumentKind;

/// Result type for filename validation
pub type FilenameResult<T> = Result<T, FilenameError>;

/// Why a caller-supplied name was rejected.
///
/// All variants surface to clients as `InvalidFilename`; the variant only
/// matters for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameError {
    #[error("invalid filename: empty")]
    Empty,

    #[error(
        "invalid filename '{name}': only alphanumeric characters, underscore, dot, space, \
         and hyphen allowed; must start with an alphanumeric character and end with '{}'",
        .kind.suffix()
    )]
    Grammar { name: String, kind: DocumentKind },

    #[error("invalid filename '{0}': not a single canonical path component")]
    NotCanonical(String),
}
