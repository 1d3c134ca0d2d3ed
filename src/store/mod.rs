//! Profile document store
//!
//! Composes the filename guard, the schema gate and the integrity codec over
//! one flat directory:
//!
//! ```text
//! write:  guard -> decode -> validate -> wrap -> temp file -> fsync -> rename -> fsync dir
//! read:   guard -> read -> unwrap -> decode -> validate (per ReadPolicy)
//! delete: guard -> unlink -> fsync dir
//! ```
//!
//! Writers and deleters of the same name are serialized; readers take no
//! lock and rely on rename atomicity.

mod document_store;
mod errors;
mod locks;

pub use document_store::{DocumentNames, DocumentStore, ReadPolicy, StoredDocument};
pub use errors::{StoreError, StoreResult};
