//! Document validation against a declared schema
//!
//! Validation semantics:
//! - All required fields are present
//! - No undeclared fields exist
//! - Field types exactly match schema types (no coercion)
//! - Numeric bounds, string lengths, enumerations and item counts hold
//! - Cross-field rules hold
//!
//! Validation never stops at the first problem. Every violation is collected
//! in document order so callers can report the first and log the rest.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult, Violation};
use super::types::{FieldDef, FieldType, Rule, Schema};

/// Result of validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Vec<Violation>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// All violations; empty when valid
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationOutcome::Valid => &[],
            ValidationOutcome::Invalid(violations) => violations,
        }
    }

    /// Converts into a `SchemaResult`, labelling failures with `schema_label`
    pub fn into_result(self, schema_label: &str) -> SchemaResult<()> {
        match self {
            ValidationOutcome::Valid => Ok(()),
            ValidationOutcome::Invalid(violations) => {
                Err(SchemaError::validation_failed(schema_label, violations))
            }
        }
    }

    fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid(violations)
        }
    }
}

/// Anything that can judge a decoded document.
///
/// The gateway only depends on this trait, so a different schema language
/// can be plugged in without touching storage or HTTP code.
pub trait DocumentValidator: Send + Sync {
    /// Validates `document`. Must be deterministic and must not mutate.
    fn validate(&self, document: &Value) -> ValidationOutcome;

    /// Short label for logs and error messages.
    fn label(&self) -> String;
}

/// Validator backed by a declarative [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Arc<Schema>,
}

impl SchemaValidator {
    /// Creates a validator for `schema`.
    ///
    /// The schema structure is checked first so that validation itself never
    /// has to deal with an inconsistent definition.
    pub fn new(schema: Schema) -> SchemaResult<Self> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema(schema.label(), e))?;
        Ok(Self {
            schema: Arc::new(schema),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn validate_object(
        &self,
        obj: &Map<String, Value>,
        fields: &BTreeMap<String, FieldDef>,
        path_prefix: &str,
        out: &mut Vec<Violation>,
    ) {
        for key in obj.keys() {
            if !fields.contains_key(key) {
                out.push(Violation::extra_field(make_path(path_prefix, key)));
            }
        }

        for (field_name, field_def) in fields {
            let field_path = make_path(path_prefix, field_name);

            match obj.get(field_name) {
                Some(Value::Null) => out.push(Violation::null_value(&field_path)),
                Some(value) => self.validate_value(value, &field_def.field_type, &field_path, out),
                None if field_def.required => out.push(Violation::missing_field(field_path)),
                None => {}
            }
        }
    }

    fn validate_value(
        &self,
        value: &Value,
        expected_type: &FieldType,
        field_path: &str,
        out: &mut Vec<Violation>,
    ) {
        match expected_type {
            FieldType::String { max_length, allowed } => {
                let Some(s) = value.as_str() else {
                    out.push(type_violation(field_path, "string", value));
                    return;
                };
                if let Some(max) = max_length {
                    let len = s.chars().count();
                    if len > *max {
                        out.push(Violation::new(
                            field_path,
                            format!("at most {} characters", max),
                            format!("{} characters", len),
                        ));
                    }
                }
                if !allowed.is_empty() && !allowed.iter().any(|a| a == s) {
                    out.push(Violation::new(
                        field_path,
                        format!("one of [{}]", allowed.join(", ")),
                        format!("'{}'", s),
                    ));
                }
            }
            FieldType::Int { minimum, maximum } => {
                // Floats are never accepted as ints, even when integral.
                let n = match value {
                    Value::Number(n) if n.is_i64() => n.as_i64(),
                    Value::Number(n) if n.is_u64() => {
                        // Above i64::MAX; can only fail an upper bound.
                        if maximum.is_some() {
                            out.push(Violation::out_of_range(
                                field_path,
                                range_text(minimum, maximum),
                                n,
                            ));
                        }
                        return;
                    }
                    _ => None,
                };
                let Some(n) = n else {
                    out.push(type_violation(field_path, "int", value));
                    return;
                };
                if minimum.map_or(false, |min| n < min) || maximum.map_or(false, |max| n > max) {
                    out.push(Violation::out_of_range(field_path, range_text(minimum, maximum), n));
                }
            }
            FieldType::Bool => {
                if !value.is_boolean() {
                    out.push(type_violation(field_path, "bool", value));
                }
            }
            FieldType::Float { minimum, maximum } => {
                // Accept both integers and floats as float
                let Some(n) = value.as_f64() else {
                    out.push(type_violation(field_path, "float", value));
                    return;
                };
                if minimum.map_or(false, |min| n < min) || maximum.map_or(false, |max| n > max) {
                    out.push(Violation::out_of_range(field_path, range_text(minimum, maximum), n));
                }
            }
            FieldType::Object { fields } => match value.as_object() {
                Some(obj) => self.validate_object(obj, fields, field_path, out),
                None => out.push(type_violation(field_path, "object", value)),
            },
            FieldType::Array {
                element_type,
                min_items,
                max_items,
            } => {
                let Some(arr) = value.as_array() else {
                    out.push(type_violation(field_path, "array", value));
                    return;
                };

                let too_few = min_items.map_or(false, |min| arr.len() < min);
                let too_many = max_items.map_or(false, |max| arr.len() > max);
                if too_few || too_many {
                    out.push(Violation::new(
                        field_path,
                        format!("{} items", range_text(min_items, max_items)),
                        format!("{} items", arr.len()),
                    ));
                }

                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}[{}]", field_path, i);
                    if elem.is_null() {
                        out.push(Violation::null_value(&elem_path));
                        continue;
                    }
                    self.validate_value(elem, element_type, &elem_path, out);
                }
            }
        }
    }

    fn check_rule(&self, document: &Value, rule: &Rule, out: &mut Vec<Violation>) {
        match rule {
            Rule::IndexWithin { index, array } => {
                // Type problems on either side were already reported.
                let (Some(idx), Some(arr)) = (
                    lookup(document, index).and_then(Value::as_i64),
                    lookup(document, array).and_then(Value::as_array),
                ) else {
                    return;
                };
                if idx < 0 || idx as u64 >= arr.len() as u64 {
                    out.push(Violation::new(
                        index.as_str(),
                        format!("an index into '{}' (0..{})", array, arr.len()),
                        idx.to_string(),
                    ));
                }
            }
            Rule::MutuallyExclusive { fields } => {
                let present: Vec<&str> = fields
                    .iter()
                    .filter(|path| lookup(document, path).map_or(false, |v| !v.is_null()))
                    .map(String::as_str)
                    .collect();
                if present.len() > 1 {
                    out.push(Violation::new(
                        present[1],
                        format!("at most one of [{}]", fields.join(", ")),
                        format!("[{}] present", present.join(", ")),
                    ));
                }
            }
            Rule::RequiredWhen { field, when, equals } => {
                if lookup(document, when) == Some(equals) && lookup(document, field).is_none() {
                    out.push(Violation::new(
                        field.as_str(),
                        format!("field to be present when '{}' is {}", when, equals),
                        "missing",
                    ));
                }
            }
        }
    }
}

impl DocumentValidator for SchemaValidator {
    fn validate(&self, document: &Value) -> ValidationOutcome {
        let mut violations = Vec::new();

        let Some(root) = document.as_object() else {
            return ValidationOutcome::Invalid(vec![type_violation("$root", "object", document)]);
        };
        self.validate_object(root, &self.schema.fields, "", &mut violations);

        for rule in &self.schema.rules {
            self.check_rule(document, rule, &mut violations);
        }

        ValidationOutcome::from_violations(violations)
    }

    fn label(&self) -> String {
        self.schema.label()
    }
}

/// Resolves a dotted path inside a document.
fn lookup<'v>(document: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(document, |value, segment| value.get(segment))
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn type_violation(field_path: &str, expected: &str, actual: &Value) -> Violation {
    Violation::type_mismatch(field_path, expected, json_type_name(actual))
}

fn range_text<T: std::fmt::Display>(minimum: &Option<T>, maximum: &Option<T>) -> String {
    match (minimum, maximum) {
        (Some(min), Some(max)) => format!("{}..={}", min, max),
        (Some(min), None) => format!(">= {}", min),
        (None, Some(max)) => format!("<= {}", max),
        (None, None) => "any".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> SchemaValidator {
        let mut zero = BTreeMap::new();
        zero.insert("x".into(), FieldDef::required(FieldType::int_range(-100, 100)));
        zero.insert("note".into(), FieldDef::optional_string());
        zero.insert("memo".into(), FieldDef::optional_string());

        let mut fields = BTreeMap::new();
        fields.insert("name".into(), FieldDef::required(FieldType::string_max(5)));
        fields.insert("dir".into(), FieldDef::required(FieldType::one_of(&["LEFT", "RIGHT"])));
        fields.insert("mode".into(), FieldDef::optional_string());
        fields.insert("extra".into(), FieldDef::optional_int());
        fields.insert("zero".into(), FieldDef::required(FieldType::object(zero)));
        fields.insert(
            "distances".into(),
            FieldDef::required(FieldType::array(FieldType::int_range(1, 1000), Some(1), Some(3))),
        );
        fields.insert("idx".into(), FieldDef::required_int());
        fields.insert("scale".into(), FieldDef::optional(FieldType::float_range(0.0, 1.0)));
        fields.insert("on".into(), FieldDef::required_bool());

        let schema = Schema::new("test", "1", fields)
            .with_rule(Rule::IndexWithin {
                index: "idx".into(),
                array: "distances".into(),
            })
            .with_rule(Rule::MutuallyExclusive {
                fields: vec!["zero.note".into(), "zero.memo".into()],
            })
            .with_rule(Rule::RequiredWhen {
                field: "extra".into(),
                when: "mode".into(),
                equals: json!("custom"),
            });
        SchemaValidator::new(schema).unwrap()
    }

    fn valid_doc() -> Value {
        json!({
            "name": "rifle",
            "dir": "LEFT",
            "zero": { "x": 10 },
            "distances": [100, 200],
            "idx": 1,
            "on": true
        })
    }

    fn fields_of(outcome: &ValidationOutcome) -> Vec<&str> {
        outcome.violations().iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn test_valid_document_passes() {
        assert_eq!(validator().validate(&valid_doc()), ValidationOutcome::Valid);
    }

    #[test]
    fn test_missing_required_field() {
        let mut doc = valid_doc();
        doc.as_object_mut().unwrap().remove("name");
        let outcome = validator().validate(&doc);
        assert_eq!(fields_of(&outcome), vec!["name"]);
        assert_eq!(outcome.violations()[0].actual, "missing");
    }

    #[test]
    fn test_extra_field_rejected() {
        let mut doc = valid_doc();
        doc["zero"]["y"] = json!(1);
        assert_eq!(fields_of(&validator().validate(&doc)), vec!["zero.y"]);
    }

    #[test]
    fn test_no_coercion() {
        let mut doc = valid_doc();
        doc["idx"] = json!(1.0);
        let outcome = validator().validate(&doc);
        assert_eq!(outcome.violations()[0].expected, "int");

        let mut doc = valid_doc();
        doc["on"] = json!("true");
        assert_eq!(fields_of(&validator().validate(&doc)), vec!["on"]);
    }

    #[test]
    fn test_null_rejected() {
        let mut doc = valid_doc();
        doc["name"] = Value::Null;
        assert_eq!(validator().validate(&doc).violations()[0].actual, "null");
    }

    #[test]
    fn test_bounds() {
        let mut doc = valid_doc();
        doc["zero"]["x"] = json!(101);
        doc["name"] = json!("too long");
        doc["dir"] = json!("UP");
        doc["scale"] = json!(1.5);
        let outcome = validator().validate(&doc);
        let mut fields = fields_of(&outcome);
        fields.sort();
        assert_eq!(fields, vec!["dir", "name", "scale", "zero.x"]);
    }

    #[test]
    fn test_huge_unsigned_is_out_of_range_not_type_error() {
        let mut doc = valid_doc();
        doc["zero"]["x"] = json!(u64::MAX);
        let outcome = validator().validate(&doc);
        assert_eq!(fields_of(&outcome), vec!["zero.x"]);
        assert_eq!(outcome.violations()[0].expected, "-100..=100");
    }

    #[test]
    fn test_item_count_and_elements() {
        let mut doc = valid_doc();
        doc["distances"] = json!([]);
        doc["idx"] = json!(0);
        let outcome = validator().validate(&doc);
        // empty array fails both the count and the index rule
        assert_eq!(fields_of(&outcome), vec!["distances", "idx"]);

        let mut doc = valid_doc();
        doc["distances"] = json!([100, 0, null]);
        let outcome = validator().validate(&doc);
        assert_eq!(fields_of(&outcome), vec!["distances[1]", "distances[2]"]);
    }

    #[test]
    fn test_index_within() {
        let mut doc = valid_doc();
        doc["idx"] = json!(2);
        let outcome = validator().validate(&doc);
        assert_eq!(fields_of(&outcome), vec!["idx"]);

        doc["idx"] = json!(-1);
        assert!(!validator().validate(&doc).is_valid());
    }

    #[test]
    fn test_mutually_exclusive() {
        let mut doc = valid_doc();
        doc["zero"]["note"] = json!("a");
        assert!(validator().validate(&doc).is_valid());
        doc["zero"]["memo"] = json!("b");
        assert_eq!(fields_of(&validator().validate(&doc)), vec!["zero.memo"]);
    }

    #[test]
    fn test_required_when() {
        let mut doc = valid_doc();
        doc["mode"] = json!("custom");
        assert_eq!(fields_of(&validator().validate(&doc)), vec!["extra"]);
        doc["extra"] = json!(3);
        assert!(validator().validate(&doc).is_valid());
        doc["mode"] = json!("plain");
        doc.as_object_mut().unwrap().remove("extra");
        assert!(validator().validate(&doc).is_valid());
    }

    #[test]
    fn test_collects_all_violations_in_order() {
        let doc = json!({ "dir": 5, "zero": {}, "distances": [1], "idx": 0, "on": 1, "bogus": true });
        let outcome = validator().validate(&doc);
        assert_eq!(fields_of(&outcome), vec!["bogus", "dir", "name", "on", "zero.x"]);
    }

    #[test]
    fn test_non_object_root() {
        let outcome = validator().validate(&json!([1, 2]));
        assert_eq!(fields_of(&outcome), vec!["$root"]);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let doc = json!({ "name": 1, "zero": [], "distances": "x" });
        let v = validator();
        assert_eq!(v.validate(&doc), v.validate(&doc));
    }

    #[test]
    fn test_into_result() {
        let mut doc = valid_doc();
        doc["idx"] = json!(9);
        let err = validator().validate(&doc).into_result("test@1").unwrap_err();
        assert!(err.message().contains("test@1"));
        assert!(err.message().contains("idx"));
    }

    #[test]
    fn test_malformed_schema_rejected() {
        let mut fields = BTreeMap::new();
        fields.insert("x".into(), FieldDef::required_int());
        let schema = Schema::new("bad", "1", fields).with_rule(Rule::IndexWithin {
            index: "x".into(),
            array: "missing".into(),
        });
        assert!(SchemaValidator::new(schema).is_err());
    }
}
