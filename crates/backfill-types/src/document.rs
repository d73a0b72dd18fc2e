//! Untyped documents and the value helpers shared by the expander and the
//! cache store.

use serde_json::{Map, Value};

use crate::path::FieldPath;

/// An untyped record: field name to JSON value.
pub type Document = Map<String, Value>;

/// Whether a field value counts as absent for expansion and keying.
///
/// Missing, `null`, `false`, `""` and `[]` are empty. Numbers (including `0`)
/// and objects are not.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

/// Render a primary-key value as a cache key fragment.
///
/// Strings are used verbatim, numbers and booleans through their JSON form.
/// Empty values and composite values yield `None`.
pub fn key_fragment(value: Option<&Value>) -> Option<String> {
    if is_empty_value(value) {
        return None;
    }
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Follow a path of plain steps from the document root.
///
/// Returns `None` if any step is missing, crosses a non-object, or is an
/// array hop.
pub fn lookup<'a>(doc: &'a Document, path: &FieldPath) -> Option<&'a Value> {
    let (first, rest) = path.steps().split_first()?;
    let mut current = doc.get(&first.name)?;
    for step in rest {
        if step.array_hop {
            return None;
        }
        current = current.as_object()?.get(&step.name)?;
    }
    Some(current)
}

/// Mutable counterpart of [`lookup`].
pub fn lookup_mut<'a>(doc: &'a mut Document, path: &FieldPath) -> Option<&'a mut Value> {
    let (first, rest) = path.steps().split_first()?;
    let mut current = doc.get_mut(&first.name)?;
    for step in rest {
        if step.array_hop {
            return None;
        }
        current = current.as_object_mut()?.get_mut(&step.name)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_values() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&Value::Null)));
        assert!(is_empty_value(Some(&json!(""))));
        assert!(is_empty_value(Some(&json!(false))));
        assert!(is_empty_value(Some(&json!([]))));

        assert!(!is_empty_value(Some(&json!(0))));
        assert!(!is_empty_value(Some(&json!("u1"))));
        assert!(!is_empty_value(Some(&json!({}))));
        assert!(!is_empty_value(Some(&json!(["c1"]))));
    }

    #[test]
    fn key_fragments() {
        assert_eq!(key_fragment(Some(&json!("abc"))), Some("abc".into()));
        assert_eq!(key_fragment(Some(&json!(42))), Some("42".into()));
        assert_eq!(key_fragment(Some(&json!(""))), None);
        assert_eq!(key_fragment(Some(&json!({"a": 1}))), None);
        assert_eq!(key_fragment(None), None);
    }

    #[test]
    fn lookup_plain_path() {
        let d = doc(json!({"meta": {"owner": "u1"}, "title": "x"}));
        let p = FieldPath::parse("meta.owner").unwrap();
        assert_eq!(lookup(&d, &p), Some(&json!("u1")));
        assert_eq!(lookup(&d, &FieldPath::root("title")), Some(&json!("x")));
        assert_eq!(lookup(&d, &FieldPath::parse("title.x").unwrap()), None);
        assert_eq!(lookup(&d, &FieldPath::root("missing")), None);
    }

    #[test]
    fn lookup_refuses_array_hops() {
        let d = doc(json!({"items": [{"product": "p1"}]}));
        assert_eq!(lookup(&d, &FieldPath::parse("items*product").unwrap()), None);
    }

    #[test]
    fn lookup_mut_replaces_nested() {
        let mut d = doc(json!({"meta": {"owner": "u1"}}));
        let p = FieldPath::parse("meta.owner").unwrap();
        *lookup_mut(&mut d, &p).unwrap() = json!({"_id": "u1"});
        assert_eq!(d["meta"]["owner"]["_id"], "u1");
    }
}
