//! Decode-and-validate gate in front of the store.

use std::sync::Arc;

use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;
use super::validator::{DocumentValidator, SchemaValidator, ValidationOutcome};

/// A decoded profile document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document(Value);

impl Document {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Decodes raw document bytes and judges them with an injected validator.
///
/// Cloning is cheap; every clone shares the same validator.
#[derive(Clone)]
pub struct SchemaGate {
    validator: Arc<dyn DocumentValidator>,
}

impl SchemaGate {
    pub fn new(validator: Arc<dyn DocumentValidator>) -> Self {
        Self { validator }
    }

    /// Gate backed by a declarative schema.
    pub fn from_schema(schema: Schema) -> SchemaResult<Self> {
        Ok(Self::new(Arc::new(SchemaValidator::new(schema)?)))
    }

    /// Decodes `raw` into a document without validating it.
    pub fn decode(&self, raw: &[u8]) -> SchemaResult<Document> {
        serde_json::from_slice(raw)
            .map(Document)
            .map_err(SchemaError::document_malformed)
    }

    /// Validates an already decoded document.
    pub fn validate(&self, document: &Document) -> ValidationOutcome {
        self.validator.validate(&document.0)
    }

    /// Decodes then validates. Fails on the first stage that rejects.
    pub fn admit(&self, raw: &[u8]) -> SchemaResult<Document> {
        let document = self.decode(raw)?;
        self.validate(&document).into_result(&self.label())?;
        Ok(document)
    }

    pub fn label(&self) -> String {
        self.validator.label()
    }
}

impl std::fmt::Debug for SchemaGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaGate")
            .field("validator", &self.validator.label())
            .finish()
    }
}
