use std::collections::BTreeMap;

use serde_json::Value;

use backfill_types::ReferenceDescriptor;

use crate::error::{SchemaError, SchemaResult};

/// Marker key carrying the target resource in a JSON declaration.
const REF_KEY: &str = "ref";

/// One declared field of a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaField {
    /// A reference to another resource, single or array.
    Leaf(ReferenceDescriptor),
    /// A plain sub-object.
    Nested(Schema),
    /// An array whose elements are sub-objects.
    ArrayOfNested(Schema),
}

/// Declarative description of the reference-bearing fields of a resource.
///
/// Only fields that are references, or that contain references somewhere
/// below them, need to be declared. Schemas are owned trees, so they can be
/// composed freely but never form cycles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    fields: BTreeMap<String, SchemaField>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field holding one identifier of `target`.
    pub fn reference(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.field(name, SchemaField::Leaf(ReferenceDescriptor::single(target)))
    }

    /// Declare a field holding an array of identifiers of `target`.
    pub fn reference_array(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.field(name, SchemaField::Leaf(ReferenceDescriptor::array(target)))
    }

    /// Declare a plain sub-object.
    pub fn nested(self, name: impl Into<String>, schema: Schema) -> Self {
        self.field(name, SchemaField::Nested(schema))
    }

    /// Declare an array of sub-objects.
    pub fn array_of(self, name: impl Into<String>, schema: Schema) -> Self {
        self.field(name, SchemaField::ArrayOfNested(schema))
    }

    /// Declare a field. A later declaration of the same name replaces the
    /// earlier one.
    pub fn field(mut self, name: impl Into<String>, field: SchemaField) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &SchemaField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a JSON schema declaration.
    ///
    /// The declaration mirrors a document-model schema:
    ///
    /// - `{"ref": "users"}` declares a reference to `users`
    /// - `[{"ref": "tags"}]` declares an array of references
    /// - `[{ ... }]` declares an array of sub-records
    /// - any other object declares a nested sub-record
    ///
    /// Scalars (type names, defaults) and empty arrays carry no references and
    /// are ignored, as are sub-records that end up declaring nothing.
    pub fn from_json(value: &Value) -> SchemaResult<Self> {
        let object = value.as_object().ok_or_else(|| SchemaError::InvalidDeclaration {
            field: "<root>".into(),
            reason: "schema declaration must be a JSON object".into(),
        })?;
        Self::parse_object(object, "")
    }

    /// Parse a JSON schema declaration from text.
    pub fn from_json_str(text: &str) -> SchemaResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    fn parse_object(object: &serde_json::Map<String, Value>, prefix: &str) -> SchemaResult<Self> {
        let mut schema = Schema::new();
        for (name, decl) in object {
            let at = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            if let Some(field) = Self::parse_field(decl, &at)? {
                schema = schema.field(name.clone(), field);
            }
        }
        Ok(schema)
    }

    fn parse_field(decl: &Value, at: &str) -> SchemaResult<Option<SchemaField>> {
        match decl {
            Value::Object(obj) => {
                if let Some(target) = obj.get(REF_KEY) {
                    return Ok(Some(SchemaField::Leaf(ReferenceDescriptor::single(
                        Self::target_name(target, at)?,
                    ))));
                }
                let nested = Self::parse_object(obj, at)?;
                Ok((!nested.is_empty()).then_some(SchemaField::Nested(nested)))
            }
            Value::Array(items) => {
                let Some(Value::Object(element)) = items.first() else {
                    return Ok(None);
                };
                if let Some(target) = element.get(REF_KEY) {
                    return Ok(Some(SchemaField::Leaf(ReferenceDescriptor::array(
                        Self::target_name(target, at)?,
                    ))));
                }
                let nested = Self::parse_object(element, at)?;
                Ok((!nested.is_empty()).then_some(SchemaField::ArrayOfNested(nested)))
            }
            _ => Ok(None),
        }
    }

    fn target_name(target: &Value, at: &str) -> SchemaResult<String> {
        match target {
            Value::String(s) if !s.is_empty() => Ok(s.clone()),
            _ => Err(SchemaError::InvalidDeclaration {
                field: at.to_string(),
                reason: "`ref` must be a non-empty string".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_declares_fields() {
        let s = Schema::new()
            .reference("author", "users")
            .reference_array("tags", "tags")
            .nested("meta", Schema::new().reference("owner", "users"));
        assert_eq!(s.len(), 3);
        assert_eq!(
            s.get("author"),
            Some(&SchemaField::Leaf(ReferenceDescriptor::single("users")))
        );
        assert!(matches!(s.get("meta"), Some(SchemaField::Nested(_))));
    }

    #[test]
    fn redeclaring_replaces() {
        let s = Schema::new()
            .reference("author", "users")
            .reference("author", "members");
        assert_eq!(
            s.get("author"),
            Some(&SchemaField::Leaf(ReferenceDescriptor::single("members")))
        );
    }

    #[test]
    fn parses_json_declaration() {
        let s = Schema::from_json(&json!({
            "title": "String",
            "author": {"type": "ObjectId", "ref": "users"},
            "comments": [{"type": "ObjectId", "ref": "comments"}],
            "labels": ["String"],
            "meta": {"owner": {"ref": "users"}, "score": {"type": "Number"}},
            "items": [{"product": {"ref": "products"}, "qty": "Number"}],
            "empty": [],
            "settings": {"type": "Mixed"}
        }))
        .unwrap();

        assert_eq!(s.len(), 4);
        assert_eq!(
            s.get("comments"),
            Some(&SchemaField::Leaf(ReferenceDescriptor::array("comments")))
        );
        let Some(SchemaField::Nested(meta)) = s.get("meta") else {
            panic!("meta should be nested");
        };
        assert_eq!(meta.len(), 1);
        assert!(matches!(s.get("items"), Some(SchemaField::ArrayOfNested(_))));
        assert!(s.get("labels").is_none());
        assert!(s.get("settings").is_none());
    }

    #[test]
    fn rejects_non_string_ref() {
        let err = Schema::from_json(&json!({"meta": {"owner": {"ref": 5}}})).unwrap_err();
        match err {
            SchemaError::InvalidDeclaration { field, .. } => assert_eq!(field, "meta.owner"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_object_root() {
        assert!(matches!(
            Schema::from_json(&json!(["x"])),
            Err(SchemaError::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn from_json_str_reports_syntax_errors() {
        assert!(matches!(Schema::from_json_str("{"), Err(SchemaError::Json(_))));
    }
}
