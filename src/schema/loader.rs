//! Schema loading
//!
//! A gateway runs with exactly one profile schema: either the built-in one
//! or a JSON schema file named at startup. A file that cannot be read,
//! parsed or structurally validated is a startup failure.

use std::fs;
use std::path::Path;

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// Reads schema definitions from disk.
pub struct SchemaLoader;

impl SchemaLoader {
    /// Loads and structurally validates the schema file at `path`.
    pub fn load_file(path: &Path) -> SchemaResult<Schema> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        Self::parse(&content, &path.display().to_string())
    }

    /// Parses a schema from JSON text. `origin` only labels errors.
    pub fn parse(json: &str, origin: &str) -> SchemaResult<Schema> {
        let schema: Schema = serde_json::from_str(json)
            .map_err(|e| SchemaError::malformed_schema(origin, format!("Invalid JSON: {}", e)))?;

        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema(origin, e))?;

        Ok(schema)
    }

    /// Writes `schema` as pretty JSON, e.g. to seed an editable copy of the
    /// built-in schema.
    pub fn save_file(schema: &Schema, path: &Path) -> SchemaResult<()> {
        let content = serde_json::to_string_pretty(schema).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to serialize schema: {}", e),
            )
        })?;

        fs::write(path, content).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to write file: {}", e),
            )
        })
    }
}
