//! Schema error types
//!
//! Error codes:
//! - SCHEMA_DOCUMENT_MALFORMED (document bytes are not a well-formed document)
//! - SCHEMA_VALIDATION_FAILED (document violates the declared schema)
//! - SCHEMA_MALFORMED (the schema definition itself is unusable)

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Bytes could not be decoded into a document
    DocumentMalformed,
    /// Document violates schema
    ValidationFailed,
    /// Schema file or definition is unusable
    SchemaMalformed,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::DocumentMalformed => "SCHEMA_DOCUMENT_MALFORMED",
            SchemaErrorCode::ValidationFailed => "SCHEMA_VALIDATION_FAILED",
            SchemaErrorCode::SchemaMalformed => "SCHEMA_MALFORMED",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Field path (e.g., "profile.distances[3]")
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, "field to be present", "missing")
    }

    pub fn extra_field(field: impl Into<String>) -> Self {
        Self::new(field, "no undeclared fields", "extra field present")
    }

    pub fn type_mismatch(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::new(field, expected, actual)
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self::new(field, "non-null value", "null")
    }

    pub fn out_of_range(field: impl Into<String>, range: impl Into<String>, actual: impl fmt::Display) -> Self {
        Self::new(field, range, actual.to_string())
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': expected {}, got {}", self.field, self.expected, self.actual)
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    violations: Vec<Violation>,
}

impl SchemaError {
    /// Create a document decode error
    pub fn document_malformed(reason: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::DocumentMalformed,
            message: format!("Document could not be decoded: {}", reason),
            violations: Vec::new(),
        }
    }

    /// Create a validation failed error.
    ///
    /// The message names the first violation; all of them stay available
    /// through [`SchemaError::violations`].
    pub fn validation_failed(schema_label: &str, violations: Vec<Violation>) -> Self {
        let message = match violations.first() {
            Some(first) if violations.len() > 1 => format!(
                "Document violates schema {}: {} (and {} more)",
                schema_label,
                first,
                violations.len() - 1
            ),
            Some(first) => format!("Document violates schema {}: {}", schema_label, first),
            None => format!("Document violates schema {}", schema_label),
        };
        Self {
            code: SchemaErrorCode::ValidationFailed,
            message,
            violations,
        }
    }

    /// Create an error for a malformed schema file
    pub fn malformed_schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::SchemaMalformed,
            message: format!("Malformed schema '{}': {}", path.into(), reason.into()),
            violations: Vec::new(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns every violation found, in discovery order
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::DocumentMalformed.code(), "SCHEMA_DOCUMENT_MALFORMED");
        assert_eq!(SchemaErrorCode::ValidationFailed.code(), "SCHEMA_VALIDATION_FAILED");
        assert_eq!(SchemaErrorCode::SchemaMalformed.code(), "SCHEMA_MALFORMED");
    }

    #[test]
    fn test_violation_display() {
        let v = Violation::type_mismatch("age", "int", "string");
        let display = format!("{}", v);
        assert!(display.contains("age"));
        assert!(display.contains("int"));
        assert!(display.contains("string"));
    }

    #[test]
    fn test_validation_failed_surfaces_first_violation() {
        let err = SchemaError::validation_failed(
            "profile@1",
            vec![
                Violation::missing_field("profile.zero_x"),
                Violation::missing_field("profile.zero_y"),
            ],
        );
        assert_eq!(err.code(), SchemaErrorCode::ValidationFailed);
        assert!(err.message().contains("profile.zero_x"));
        assert!(err.message().contains("1 more"));
        assert_eq!(err.violations().len(), 2);
    }
}
