//! Directory schemas and field validation.
//!
//! A schema maps field names to [`FieldDescriptor`]s. It belongs to a
//! directory, not to a document, so the schema governing a document is the
//! one of whatever directory it currently lives in.

use crate::error::{DocError, Result};
use crate::parser::{validate_key, FrontMatter, FrontMatterPatch, Scalar, Value};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Field type taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    MultiText,
    MultiNumber,
    MultiBoolean,
    Relation,
    MultiRelation,
    /// Text or number constrained to `options`.
    Select,
    MultiSelect,
}

impl FieldType {
    /// Whether values of this type are lists.
    pub fn is_array_type(self) -> bool {
        matches!(
            self,
            FieldType::MultiText
                | FieldType::MultiNumber
                | FieldType::MultiBoolean
                | FieldType::MultiRelation
                | FieldType::MultiSelect
        )
    }

    pub fn is_relation(self) -> bool {
        matches!(self, FieldType::Relation | FieldType::MultiRelation)
    }

    /// Scalar type of a list element, or the type itself for scalars.
    pub fn base(self) -> FieldType {
        match self {
            FieldType::MultiText => FieldType::Text,
            FieldType::MultiNumber => FieldType::Number,
            FieldType::MultiBoolean => FieldType::Boolean,
            FieldType::MultiRelation => FieldType::Relation,
            FieldType::MultiSelect => FieldType::Select,
            scalar => scalar,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::MultiText => "multi-text",
            FieldType::MultiNumber => "multi-number",
            FieldType::MultiBoolean => "multi-boolean",
            FieldType::Relation => "relation",
            FieldType::MultiRelation => "multi-relation",
            FieldType::Select => "select",
            FieldType::MultiSelect => "multi-select",
        };
        f.write_str(name)
    }
}

/// Description of one schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Directory whose documents are valid relation targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Allowed values for select types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Scalar>,
}

impl FieldDescriptor {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            description: None,
            relation_path: None,
            default: None,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn relation(field_type: FieldType, relation_path: impl Into<String>) -> Self {
        Self {
            relation_path: Some(relation_path.into()),
            ..Self::new(field_type)
        }
    }

    pub fn with_options(mut self, options: Vec<Scalar>) -> Self {
        self.options = options;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Check that the descriptor is internally consistent.
    fn check(&self, name: &str) -> Result<()> {
        validate_key(name)?;
        match (self.field_type.is_relation(), &self.relation_path) {
            (true, None) => {
                return Err(DocError::schema(name, "relation fields need a relationPath"));
            }
            (false, Some(_)) => {
                return Err(DocError::schema(
                    name,
                    format!("relationPath is not allowed on {} fields", self.field_type),
                ));
            }
            _ => {}
        }
        if !self.options.is_empty() && self.field_type.base() != FieldType::Select {
            return Err(DocError::schema(
                name,
                format!("options are not allowed on {} fields", self.field_type),
            ));
        }
        if let Some(ref default) = self.default {
            if !validate(self, default) {
                return Err(DocError::schema(
                    name,
                    format!("default {} is not a valid {}", default.kind(), self.field_type),
                ));
            }
        }
        Ok(())
    }
}

fn check_scalar(field: &FieldDescriptor, scalar: &Scalar) -> bool {
    match (field.field_type.base(), scalar) {
        (FieldType::Text | FieldType::Relation, Scalar::Text(_)) => true,
        (FieldType::Number, Scalar::Number(_)) => true,
        (FieldType::Boolean, Scalar::Bool(_)) => true,
        (FieldType::Select, Scalar::Text(_) | Scalar::Number(_)) => {
            field.options.is_empty() || field.options.contains(scalar)
        }
        _ => false,
    }
}

/// Check a value against a field's type.
///
/// Relation fields are checked for shape only; whether the referenced
/// document exists is not this layer's concern.
pub fn validate(field: &FieldDescriptor, value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::List(items) => {
            field.field_type.is_array_type() && items.iter().all(|item| check_scalar(field, item))
        }
        Value::Bool(b) => !field.field_type.is_array_type() && check_scalar(field, &Scalar::Bool(*b)),
        Value::Number(n) => {
            !field.field_type.is_array_type() && check_scalar(field, &Scalar::Number(n.clone()))
        }
        Value::Text(s) => {
            !field.field_type.is_array_type() && check_scalar(field, &Scalar::Text(s.clone()))
        }
    }
}

/// Value a new document starts with for this field.
pub fn default_value(field: &FieldDescriptor) -> Value {
    if let Some(ref default) = field.default {
        if validate(field, default) {
            return default.clone();
        }
    }

    match field.field_type {
        t if t.is_array_type() => Value::List(Vec::new()),
        FieldType::Number => Value::Number(0.into()),
        FieldType::Boolean => Value::Bool(false),
        FieldType::Select => field
            .options
            .first()
            .cloned()
            .map(Value::from)
            .unwrap_or_else(|| Value::Text(String::new())),
        _ => Value::Text(String::new()),
    }
}

/// Whether values of this type are lists.
pub fn is_array_type(field_type: FieldType) -> bool {
    field_type.is_array_type()
}

/// Why a front-matter field does not satisfy its schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    MissingRequired,
    TypeMismatch,
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

/// Ordered mapping from field name to descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<(String, FieldDescriptor)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, validating the descriptor.
    pub fn with_field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Result<Self> {
        let name = name.into();
        field.check(&name)?;
        self.fields.retain(|(n, _)| *n != name);
        self.fields.push((name, field));
        Ok(self)
    }

    /// Parse a schema from its JSON form.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields of relation type, in schema order.
    pub fn relation_fields(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.iter().filter(|(_, f)| f.field_type.is_relation())
    }

    /// Front matter seeded with every field's default.
    pub fn defaults(&self) -> FrontMatter {
        let mut fm = FrontMatter::new();
        for (name, field) in &self.fields {
            fm.insert(name.clone(), default_value(field));
        }
        fm
    }

    /// All violations of this schema in `front_matter`.
    pub fn validate_front_matter(&self, front_matter: &FrontMatter) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        for (name, field) in &self.fields {
            match front_matter.get(name) {
                None if field.required => violations.push(FieldViolation {
                    field: name.clone(),
                    kind: ViolationKind::MissingRequired,
                    message: format!("required {} field '{}' is missing", field.field_type, name),
                }),
                None => {}
                Some(value) if !validate(field, value) => violations.push(FieldViolation {
                    field: name.clone(),
                    kind: ViolationKind::TypeMismatch,
                    message: format!(
                        "'{}' expects {}, found {}",
                        name,
                        field.field_type,
                        value.kind()
                    ),
                }),
                Some(_) => {}
            }
        }
        violations
    }

    /// Reject patches that set invalid values or remove required fields.
    ///
    /// Keys not described by the schema pass through unchecked.
    pub fn validate_patch(&self, patch: &FrontMatterPatch) -> Result<()> {
        for (name, value) in patch.iter() {
            let Some(field) = self.get(name) else { continue };
            match value {
                None if field.required => {
                    return Err(DocError::schema(name, "required field cannot be removed"));
                }
                None => {}
                Some(value) if !validate(field, value) => {
                    return Err(DocError::schema(
                        name,
                        format!("expected {}, found {}", field.field_type, value.kind()),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, field) in &self.fields {
            map.serialize_entry(name, field)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to field descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Schema, A::Error> {
                let mut schema = Schema::new();
                while let Some((name, field)) = access.next_entry::<String, FieldDescriptor>()? {
                    schema = schema
                        .with_field(name, field)
                        .map_err(serde::de::Error::custom)?;
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn value(json: serde_json::Value) -> Value {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_multi_number() {
        let field = FieldDescriptor::new(FieldType::MultiNumber);
        assert!(validate(&field, &value(json!([1, 2, 3]))));
        assert!(validate(&field, &value(json!([]))));
        assert!(!validate(&field, &value(json!(123))));
        assert!(!validate(&field, &value(json!(["1", "2"]))));
        assert!(!validate(&field, &Value::Null));
    }

    #[test]
    fn test_scalar_types() {
        let text = FieldDescriptor::new(FieldType::Text);
        assert!(validate(&text, &Value::from("hi")));
        assert!(!validate(&text, &Value::from(1)));
        assert!(!validate(&text, &value(json!(["a"]))));

        let boolean = FieldDescriptor::new(FieldType::Boolean);
        assert!(validate(&boolean, &Value::Bool(true)));
        assert!(!validate(&boolean, &Value::from("true")));
    }

    #[test]
    fn test_relation_checks_shape_only() {
        let one = FieldDescriptor::relation(FieldType::Relation, "features");
        assert!(validate(&one, &Value::from("does-not-exist")));
        assert!(!validate(&one, &Value::from(3)));

        let many = FieldDescriptor::relation(FieldType::MultiRelation, "features");
        assert!(validate(&many, &value(json!(["x", "y"]))));
        assert!(!validate(&many, &Value::from("x")));
        assert!(!validate(&many, &value(json!(["x", 1]))));
    }

    #[test]
    fn test_select_options() {
        let field = FieldDescriptor::new(FieldType::Select)
            .with_options(vec!["draft".into(), "live".into()]);
        assert!(validate(&field, &Value::from("live")));
        assert!(!validate(&field, &Value::from("gone")));
        assert_eq!(default_value(&field), Value::from("draft"));

        let multi = FieldDescriptor::new(FieldType::MultiSelect).with_options(vec![1.into(), 2.into()]);
        assert!(validate(&multi, &value(json!([2, 1]))));
        assert!(!validate(&multi, &value(json!([3]))));
    }

    #[test]
    fn test_default_values() {
        let cases = [
            (FieldType::Text, json!("")),
            (FieldType::Number, json!(0)),
            (FieldType::Boolean, json!(false)),
            (FieldType::MultiText, json!([])),
            (FieldType::MultiNumber, json!([])),
            (FieldType::MultiBoolean, json!([])),
            (FieldType::MultiRelation, json!([])),
        ];
        for (field_type, expected) in cases {
            let field = FieldDescriptor::new(field_type);
            assert_eq!(default_value(&field), value(expected), "{}", field_type);
        }
        let relation = FieldDescriptor::relation(FieldType::Relation, "x");
        assert_eq!(default_value(&relation), Value::from(""));
    }

    #[test]
    fn test_explicit_default() {
        let field = FieldDescriptor::new(FieldType::Number).with_default(7);
        assert_eq!(default_value(&field), Value::from(7));
    }

    #[test]
    fn test_is_array_type() {
        assert!(is_array_type(FieldType::MultiText));
        assert!(is_array_type(FieldType::MultiRelation));
        assert!(!is_array_type(FieldType::Relation));
        assert!(!is_array_type(FieldType::Select));
    }

    #[test]
    fn test_schema_from_json_keeps_order() {
        let schema = Schema::from_json(
            r#"{
                "title": {"type": "text", "required": true},
                "features": {"type": "multi-relation", "relationPath": "features"},
                "order": {"type": "number", "default": 10}
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = schema.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["title", "features", "order"]);
        assert_eq!(
            schema.get("features").unwrap().relation_path.as_deref(),
            Some("features")
        );

        let defaults = schema.defaults();
        assert_eq!(defaults.get("title"), Some(&Value::from("")));
        assert_eq!(defaults.get("features"), Some(&Value::List(vec![])));
        assert_eq!(defaults.get("order"), Some(&Value::from(10)));
    }

    #[test]
    fn test_schema_rejects_inconsistent_descriptors() {
        assert!(Schema::from_json(r#"{"r": {"type": "relation"}}"#).is_err());
        assert!(Schema::from_json(r#"{"t": {"type": "text", "relationPath": "x"}}"#).is_err());
        assert!(Schema::from_json(r#"{"n": {"type": "number", "default": "zero"}}"#).is_err());
        assert!(Schema::from_json(r#"{"t": {"type": "colour"}}"#).is_err());
    }

    #[test]
    fn test_validate_front_matter() {
        let schema = Schema::new()
            .with_field("title", FieldDescriptor::new(FieldType::Text).required())
            .unwrap()
            .with_field("count", FieldDescriptor::new(FieldType::Number))
            .unwrap();

        let fm = FrontMatter::new().set("count", "three").unwrap();
        let violations = schema.validate_front_matter(&fm);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].kind, ViolationKind::MissingRequired);
        assert_eq!(violations[1].kind, ViolationKind::TypeMismatch);
    }

    #[test]
    fn test_validate_patch() {
        let schema = Schema::new()
            .with_field("title", FieldDescriptor::new(FieldType::Text).required())
            .unwrap();

        let ok = FrontMatterPatch::new()
            .set("title", "Home")
            .unwrap()
            .set("unknown", 1)
            .unwrap();
        assert!(schema.validate_patch(&ok).is_ok());

        let wrong_type = FrontMatterPatch::new().set("title", 5).unwrap();
        assert!(matches!(
            schema.validate_patch(&wrong_type),
            Err(DocError::SchemaValidationFailed { .. })
        ));

        let removal = FrontMatterPatch::new().remove("title");
        assert!(schema.validate_patch(&removal).is_err());
    }
}
