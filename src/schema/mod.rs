//! Schema gate for stored profiles
//!
//! Every document is decoded and validated before it is written, and again
//! when read back under the revalidating read policy.
//!
//! # Design Principles
//!
//! - No nulls, defaults, or coercion
//! - No undeclared fields
//! - Deterministic validation; all violations are collected
//! - The validator is injected, so the schema language is replaceable

mod errors;
mod gate;
mod loader;
mod profile;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Violation};
pub use gate::{Document, SchemaGate};
pub use loader::SchemaLoader;
pub use profile::{profile_schema, PROFILE_SCHEMA_ID, PROFILE_SCHEMA_VERSION};
pub use types::{FieldDef, FieldType, Rule, Schema};
pub use validator::{DocumentValidator, SchemaValidator, ValidationOutcome};
