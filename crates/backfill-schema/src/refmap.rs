use std::collections::BTreeMap;

use serde::Serialize;

use backfill_types::{FieldPath, ReferenceDescriptor};

use crate::crawler::SchemaCrawler;
use crate::error::SchemaResult;
use crate::schema::Schema;

/// Flattened mapping from field path to reference descriptor.
///
/// Built once from a [`Schema`] and never mutated afterwards. Lookups are
/// exact-match on the structured path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReferenceMap {
    entries: BTreeMap<FieldPath, ReferenceDescriptor>,
}

impl ReferenceMap {
    /// Crawl `schema` with the default crawler configuration.
    pub fn build(schema: &Schema) -> SchemaResult<Self> {
        SchemaCrawler::default().crawl(schema)
    }

    pub(crate) fn from_entries(entries: BTreeMap<FieldPath, ReferenceDescriptor>) -> Self {
        Self { entries }
    }

    pub fn get(&self, path: &FieldPath) -> Option<&ReferenceDescriptor> {
        self.entries.get(path)
    }

    /// Look up a path given in its serialized form. Unparseable paths simply
    /// do not match.
    pub fn get_str(&self, path: &str) -> Option<&ReferenceDescriptor> {
        FieldPath::parse(path).ok().and_then(|p| self.entries.get(&p))
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &ReferenceDescriptor)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_only() {
        let map = ReferenceMap::build(&Schema::new().reference("author", "users")).unwrap();
        assert!(map.get_str("author").is_some());
        assert!(map.get_str("author.profile").is_none());
        assert!(map.get_str("auth").is_none());
        assert!(map.get_str("").is_none());
    }

    #[test]
    fn serializes_with_string_keys() {
        let map = ReferenceMap::build(
            &Schema::new().array_of("items", Schema::new().reference("product", "products")),
        )
        .unwrap();
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["items*product"]["target"], "products");
        assert_eq!(json["items*product"]["is_array"], false);
    }
}
