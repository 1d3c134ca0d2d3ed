//! Schema type definitions
//!
//! Supported field types:
//! - string: UTF-8 string, optional max length and enumerated values
//! - int: 64-bit signed integer, optional inclusive bounds
//! - bool: Boolean
//! - float: 64-bit floating point, optional inclusive bounds
//! - object: Nested object with field schema
//! - array: Homogeneous array with element type and item count bounds
//!
//! Cross-field rules are declared next to the fields and address them by
//! dotted path (`profile.distances`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Supported field types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String {
        /// Maximum length in characters
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        /// Allowed values; empty means unrestricted
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        allowed: Vec<String>,
    },
    /// 64-bit signed integer
    Int {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
    },
    /// Boolean
    Bool,
    /// 64-bit floating point
    Float {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    /// Nested object with its own field schema
    Object {
        /// Nested field definitions
        fields: BTreeMap<String, FieldDef>,
    },
    /// Homogeneous array with single element type
    Array {
        /// Element type (boxed to allow recursive types)
        element_type: Box<FieldType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String { .. } => "string",
            FieldType::Int { .. } => "int",
            FieldType::Bool => "bool",
            FieldType::Float { .. } => "float",
            FieldType::Object { .. } => "object",
            FieldType::Array { .. } => "array",
        }
    }

    /// Unbounded string
    pub fn string() -> Self {
        FieldType::String {
            max_length: None,
            allowed: Vec::new(),
        }
    }

    /// String of at most `max_length` characters
    pub fn string_max(max_length: usize) -> Self {
        FieldType::String {
            max_length: Some(max_length),
            allowed: Vec::new(),
        }
    }

    /// String restricted to an enumerated set
    pub fn one_of(allowed: &[&str]) -> Self {
        FieldType::String {
            max_length: None,
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Unbounded integer
    pub fn int() -> Self {
        FieldType::Int {
            minimum: None,
            maximum: None,
        }
    }

    /// Integer within `[minimum, maximum]`
    pub fn int_range(minimum: i64, maximum: i64) -> Self {
        FieldType::Int {
            minimum: Some(minimum),
            maximum: Some(maximum),
        }
    }

    /// Float within `[minimum, maximum]`
    pub fn float_range(minimum: f64, maximum: f64) -> Self {
        FieldType::Float {
            minimum: Some(minimum),
            maximum: Some(maximum),
        }
    }

    /// Array of `element_type` with optional item count bounds
    pub fn array(element_type: FieldType, min_items: Option<usize>, max_items: Option<usize>) -> Self {
        FieldType::Array {
            element_type: Box::new(element_type),
            min_items,
            max_items,
        }
    }

    /// Nested object
    pub fn object(fields: BTreeMap<String, FieldDef>) -> Self {
        FieldType::Object { fields }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether field must be present
    pub required: bool,
}

impl FieldDef {
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
        }
    }

    pub fn optional(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
        }
    }

    /// Create a required unbounded string field
    pub fn required_string() -> Self {
        Self::required(FieldType::string())
    }

    /// Create an optional unbounded string field
    pub fn optional_string() -> Self {
        Self::optional(FieldType::string())
    }

    /// Create a required unbounded int field
    pub fn required_int() -> Self {
        Self::required(FieldType::int())
    }

    /// Create an optional unbounded int field
    pub fn optional_int() -> Self {
        Self::optional(FieldType::int())
    }

    /// Create a required bool field
    pub fn required_bool() -> Self {
        Self::required(FieldType::Bool)
    }
}

/// Cross-field constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// The integer at `index` must be a valid index into the array at `array`.
    IndexWithin { index: String, array: String },
    /// At most one of `fields` may be present.
    MutuallyExclusive { fields: Vec<String> },
    /// `field` must be present whenever the value at `when` equals `equals`.
    RequiredWhen {
        field: String,
        when: String,
        equals: Value,
    },
}

impl Rule {
    /// All field paths this rule refers to.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Rule::IndexWithin { index, array } => vec![index.as_str(), array.as_str()],
            Rule::MutuallyExclusive { fields } => fields.iter().map(String::as_str).collect(),
            Rule::RequiredWhen { field, when, .. } => vec![field.as_str(), when.as_str()],
        }
    }
}

/// Complete schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Unique schema identifier
    pub schema_id: String,
    /// Schema version
    pub schema_version: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Top-level field definitions
    pub fields: BTreeMap<String, FieldDef>,
    /// Cross-field rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

impl Schema {
    /// Create a new schema without cross-field rules
    pub fn new(
        schema_id: impl Into<String>,
        schema_version: impl Into<String>,
        fields: BTreeMap<String, FieldDef>,
    ) -> Self {
        Self {
            schema_id: schema_id.into(),
            schema_version: schema_version.into(),
            description: None,
            fields,
            rules: Vec::new(),
        }
    }

    /// Adds a cross-field rule
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// `id@version`, for logs and messages
    pub fn label(&self) -> String {
        format!("{}@{}", self.schema_id, self.schema_version)
    }

    /// Resolves a dotted path to its field definition.
    ///
    /// Only walks through object fields; array elements are not addressable.
    pub fn field_at(&self, path: &str) -> Option<&FieldDef> {
        let mut fields = &self.fields;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let def = fields.get(segment)?;
            if segments.peek().is_none() {
                return Some(def);
            }
            match &def.field_type {
                FieldType::Object { fields: nested } => fields = nested,
                _ => return None,
            }
        }
        None
    }

    /// Validates the schema structure itself (not a document)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.schema_id.is_empty() || self.schema_version.is_empty() {
            return Err("schema_id and schema_version must be non-empty".into());
        }
        if self.fields.is_empty() {
            return Err("Schema must define at least one field".into());
        }

        check_bounds(&self.fields, "")?;

        for rule in &self.rules {
            for path in rule.paths() {
                if self.field_at(path).is_none() {
                    return Err(format!("Rule refers to undeclared field '{}'", path));
                }
            }
            match rule {
                Rule::IndexWithin { index, array } => {
                    let index_ok = matches!(
                        self.field_at(index).map(|d| &d.field_type),
                        Some(FieldType::Int { .. })
                    );
                    let array_ok = matches!(
                        self.field_at(array).map(|d| &d.field_type),
                        Some(FieldType::Array { .. })
                    );
                    if !index_ok || !array_ok {
                        return Err(format!(
                            "index_within needs an int index and an array, got '{}' and '{}'",
                            index, array
                        ));
                    }
                }
                Rule::MutuallyExclusive { fields } => {
                    if fields.len() < 2 {
                        return Err("mutually_exclusive needs at least two fields".into());
                    }
                    if let Some(path) = fields
                        .iter()
                        .find(|p| self.field_at(p).map_or(false, |d| d.required))
                    {
                        return Err(format!(
                            "mutually_exclusive field '{}' must be optional",
                            path
                        ));
                    }
                }
                Rule::RequiredWhen { .. } => {}
            }
        }

        Ok(())
    }
}

fn check_bounds(fields: &BTreeMap<String, FieldDef>, prefix: &str) -> Result<(), String> {
    for (name, def) in fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        check_type_bounds(&def.field_type, &path)?;
    }
    Ok(())
}

fn check_type_bounds(field_type: &FieldType, path: &str) -> Result<(), String> {
    match field_type {
        FieldType::Int {
            minimum: Some(min),
            maximum: Some(max),
        } if min > max => Err(format!("'{}': minimum {} exceeds maximum {}", path, min, max)),
        FieldType::Float {
            minimum: Some(min),
            maximum: Some(max),
        } if min > max => Err(format!("'{}': minimum {} exceeds maximum {}", path, min, max)),
        FieldType::Object { fields } => check_bounds(fields, path),
        FieldType::Array {
            element_type,
            min_items,
            max_items,
        } => {
            if let (Some(min), Some(max)) = (min_items, max_items) {
                if min > max {
                    return Err(format!("'{}': min_items {} exceeds max_items {}", path, min, max));
                }
            }
            check_type_bounds(element_type, &format!("{}[]", path))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        let mut zero = BTreeMap::new();
        zero.insert("x".into(), FieldDef::required(FieldType::int_range(-100, 100)));
        zero.insert("note".into(), FieldDef::optional_string());
        zero.insert("memo".into(), FieldDef::optional_string());

        let mut fields = BTreeMap::new();
        fields.insert("name".into(), FieldDef::required(FieldType::string_max(10)));
        fields.insert("zero".into(), FieldDef::required(FieldType::object(zero)));
        fields.insert(
            "distances".into(),
            FieldDef::required(FieldType::array(FieldType::int(), Some(1), Some(5))),
        );
        fields.insert("idx".into(), FieldDef::required_int());

        Schema::new("profile", "1", fields)
    }

    #[test]
    fn test_schema_structure_valid() {
        let schema = sample_schema().with_rule(Rule::IndexWithin {
            index: "idx".into(),
            array: "distances".into(),
        });
        assert!(schema.validate_structure().is_ok());
    }

    #[test]
    fn test_field_at_nested() {
        let schema = sample_schema();
        assert_eq!(schema.field_at("zero.x").unwrap().field_type.type_name(), "int");
        assert!(schema.field_at("zero.y").is_none());
        assert!(schema.field_at("name.x").is_none());
    }

    #[test]
    fn test_rule_with_undeclared_path_rejected() {
        let schema = sample_schema().with_rule(Rule::IndexWithin {
            index: "idx".into(),
            array: "nope".into(),
        });
        let err = schema.validate_structure().unwrap_err();
        assert!(err.contains("nope"));
    }

    #[test]
    fn test_index_within_type_mismatch_rejected() {
        let schema = sample_schema().with_rule(Rule::IndexWithin {
            index: "name".into(),
            array: "distances".into(),
        });
        assert!(schema.validate_structure().is_err());
    }

    #[test]
    fn test_mutually_exclusive_requires_optional_fields() {
        let ok = sample_schema().with_rule(Rule::MutuallyExclusive {
            fields: vec!["zero.note".into(), "zero.memo".into()],
        });
        assert!(ok.validate_structure().is_ok());

        let bad = sample_schema().with_rule(Rule::MutuallyExclusive {
            fields: vec!["zero.note".into(), "zero.x".into()],
        });
        assert!(bad.validate_structure().unwrap_err().contains("optional"));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut fields = BTreeMap::new();
        fields.insert("x".into(), FieldDef::required(FieldType::int_range(10, 1)));
        let schema = Schema::new("s", "1", fields);
        assert!(schema.validate_structure().unwrap_err().contains("minimum"));
    }

    #[test]
    fn test_schema_json_shape() {
        let json = serde_json::json!({
            "schema_id": "profile",
            "schema_version": "2",
            "fields": {
                "speed": { "type": "int", "minimum": 10, "maximum": 30000, "required": true },
                "dir": { "type": "string", "allowed": ["LEFT", "RIGHT"], "required": true },
                "rows": {
                    "type": "array",
                    "element_type": { "type": "float", "minimum": 0.0 },
                    "max_items": 200,
                    "required": false
                }
            },
            "rules": [
                { "rule": "required_when", "field": "rows", "when": "dir", "equals": "LEFT" }
            ]
        });
        let schema: Schema = serde_json::from_value(json).unwrap();
        assert_eq!(schema.field_at("speed").unwrap().field_type, FieldType::int_range(10, 30000));
        assert_eq!(schema.rules.len(), 1);
        assert!(schema.validate_structure().is_ok());
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldType::string().type_name(), "string");
        assert_eq!(FieldType::int().type_name(), "int");
        assert_eq!(FieldType::Bool.type_name(), "bool");
        assert_eq!(FieldType::float_range(0.0, 1.0).type_name(), "float");
        assert_eq!(FieldType::object(BTreeMap::new()).type_name(), "object");
        assert_eq!(FieldType::array(FieldType::Bool, None, None).type_name(), "array");
    }
}
