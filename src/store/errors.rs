//! Document store errors

use thiserror::Error;

use crate::naming::FilenameError;
use crate::schema::{SchemaError, SchemaErrorCode};
use crate::storage::IntegrityError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Everything that can go wrong between a request and the slot on disk.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    InvalidFilename(#[from] FilenameError),

    /// Bytes are not a decodable document.
    #[error("{}", .0.message())]
    Decode(SchemaError),

    /// Decoded document violates the schema.
    #[error("{}", .0.message())]
    SchemaValidationFailed(SchemaError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps an I/O error on a slot, turning `NotFound` into the store's own
    /// variant.
    pub(crate) fn from_slot_io(name: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(name.to_string())
        } else {
            StoreError::io(name, source)
        }
    }

    /// Whether the stored bytes themselves are bad, as opposed to the request.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::Integrity(_))
    }
}

impl From<SchemaError> for StoreError {
    fn from(err: SchemaError) -> Self {
        match err.code() {
            SchemaErrorCode::DocumentMalformed => StoreError::Decode(err),
            SchemaErrorCode::ValidationFailed | SchemaErrorCode::SchemaMalformed => {
                StoreError::SchemaValidationFailed(err)
            }
        }
    }
}
