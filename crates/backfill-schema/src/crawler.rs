//! Schema crawler: flattens a nested [`Schema`] into a [`ReferenceMap`].

use std::collections::BTreeMap;

use tracing::debug;

use backfill_types::{FieldPath, PathStep, ReferenceDescriptor, ARRAY_HOP, PLAIN_SEPARATOR};

use crate::error::{SchemaError, SchemaResult};
use crate::refmap::ReferenceMap;
use crate::schema::{Schema, SchemaField};

/// Default bound on schema nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Configuration for the [`SchemaCrawler`].
#[derive(Clone, Debug)]
pub struct CrawlerConfig {
    /// Maximum number of nested schema levels, the root counting as one.
    pub max_depth: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Visits every declared field and records each reference under the path
/// that reaches it.
///
/// - `Leaf` records the descriptor at the current path
/// - `Nested` recurses with a plain step
/// - `ArrayOfNested` recurses with an array-hop step
#[derive(Clone, Debug, Default)]
pub struct SchemaCrawler {
    config: CrawlerConfig,
}

impl SchemaCrawler {
    pub fn new(config: CrawlerConfig) -> Self {
        Self { config }
    }

    pub fn crawl(&self, schema: &Schema) -> SchemaResult<ReferenceMap> {
        let mut entries = BTreeMap::new();
        self.visit(schema, &FieldPath::default(), false, 1, &mut entries)?;
        debug!(references = entries.len(), "reference map built");
        Ok(ReferenceMap::from_entries(entries))
    }

    fn visit(
        &self,
        schema: &Schema,
        parent: &FieldPath,
        array_hop: bool,
        depth: usize,
        out: &mut BTreeMap<FieldPath, ReferenceDescriptor>,
    ) -> SchemaResult<()> {
        if depth > self.config.max_depth {
            return Err(SchemaError::DepthExceeded {
                path: parent.to_string(),
                max_depth: self.config.max_depth,
            });
        }

        for (name, field) in schema.fields() {
            validate_name(name)?;
            let path = parent.extend(PathStep {
                name: name.to_string(),
                array_hop,
            });
            match field {
                SchemaField::Leaf(descriptor) => {
                    out.insert(path, descriptor.clone());
                }
                SchemaField::Nested(child) => self.visit(child, &path, false, depth + 1, out)?,
                SchemaField::ArrayOfNested(child) => {
                    self.visit(child, &path, true, depth + 1, out)?
                }
            }
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> SchemaResult<()> {
    if name.is_empty() {
        return Err(SchemaError::InvalidFieldName {
            name: name.to_string(),
            reason: "field name must not be empty".into(),
        });
    }
    if name.contains([PLAIN_SEPARATOR, ARRAY_HOP, ',']) || name.contains(char::is_whitespace) {
        return Err(SchemaError::InvalidFieldName {
            name: name.to_string(),
            reason: "field name must not contain '.', '*', ',' or whitespace".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn keys(map: &ReferenceMap) -> Vec<String> {
        let mut keys: Vec<String> = map.iter().map(|(p, _)| p.to_string()).collect();
        keys.sort();
        keys
    }

    #[test]
    fn direct_and_array_references() {
        let map = ReferenceMap::build(
            &Schema::new()
                .reference("author", "users")
                .reference_array("comments", "comments"),
        )
        .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_str("author"), Some(&ReferenceDescriptor::single("users")));
        assert_eq!(
            map.get_str("comments"),
            Some(&ReferenceDescriptor::array("comments"))
        );
    }

    #[test]
    fn nested_objects_use_plain_steps() {
        let map = ReferenceMap::build(&Schema::new().nested(
            "meta",
            Schema::new().nested("audit", Schema::new().reference("by", "users")),
        ))
        .unwrap();
        assert_eq!(keys(&map), vec!["meta.audit.by"]);
    }

    #[test]
    fn arrays_of_objects_use_hops() {
        let map = ReferenceMap::build(
            &Schema::new().array_of(
                "items",
                Schema::new()
                    .reference("product", "products")
                    .nested("vendor", Schema::new().reference("contact", "users"))
                    .array_of("parts", Schema::new().reference_array("suppliers", "orgs")),
            ),
        )
        .unwrap();
        assert_eq!(
            keys(&map),
            vec![
                "items*parts*suppliers",
                "items*product",
                "items*vendor.contact",
            ]
        );
        assert!(map.get_str("items*parts*suppliers").unwrap().is_array);
    }

    #[test]
    fn empty_schema_yields_empty_map() {
        assert!(ReferenceMap::build(&Schema::new()).unwrap().is_empty());
    }

    #[test]
    fn depth_cap_enforced() {
        let mut schema = Schema::new().reference("leaf", "things");
        for _ in 0..5 {
            schema = Schema::new().nested("n", schema);
        }
        let crawler = SchemaCrawler::new(CrawlerConfig { max_depth: 3 });
        let err = crawler.crawl(&schema).unwrap_err();
        assert!(matches!(err, SchemaError::DepthExceeded { max_depth: 3, .. }));

        let crawler = SchemaCrawler::new(CrawlerConfig { max_depth: 6 });
        let map = crawler.crawl(&schema).unwrap();
        assert_eq!(keys(&map), vec!["n.n.n.n.n.leaf"]);
    }

    #[test]
    fn rejects_ambiguous_field_names() {
        for bad in ["a.b", "a*b", "a,b", "a b", ""] {
            let err = ReferenceMap::build(&Schema::new().reference(bad, "users")).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidFieldName { .. }), "{bad:?}");
        }
    }

    #[derive(Clone, Debug)]
    enum Node {
        Leaf(bool),
        Nested(Vec<(String, Node)>),
        Array(Vec<(String, Node)>),
    }

    fn node() -> impl Strategy<Value = Node> {
        let leaf = any::<bool>().prop_map(Node::Leaf);
        leaf.prop_recursive(4, 24, 4, |inner| {
            let children = proptest::collection::vec(("[a-z]{1,4}", inner), 1..4);
            prop_oneof![
                children.clone().prop_map(Node::Nested),
                children.prop_map(Node::Array),
            ]
        })
    }

    fn to_schema(children: &[(String, Node)]) -> Schema {
        children.iter().fold(Schema::new(), |s, (name, n)| match n {
            Node::Leaf(false) => s.reference(name.clone(), "t"),
            Node::Leaf(true) => s.reference_array(name.clone(), "t"),
            Node::Nested(c) => s.nested(name.clone(), to_schema(c)),
            Node::Array(c) => s.array_of(name.clone(), to_schema(c)),
        })
    }

    /// Expected serialized paths of every leaf, computed independently of the
    /// crawler by walking the declared schema.
    fn expected(schema: &Schema, prefix: &str, sep: char, out: &mut Vec<String>) {
        for (name, field) in schema.fields() {
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}{sep}{name}")
            };
            match field {
                SchemaField::Leaf(_) => out.push(path),
                SchemaField::Nested(c) => expected(c, &path, PLAIN_SEPARATOR, out),
                SchemaField::ArrayOfNested(c) => expected(c, &path, ARRAY_HOP, out),
            }
        }
    }

    proptest! {
        #[test]
        fn every_declared_reference_is_mapped(
            root in proptest::collection::vec(("[a-z]{1,4}", node()), 1..5)
        ) {
            let schema = to_schema(&root);
            let map = ReferenceMap::build(&schema).unwrap();

            let mut want = Vec::new();
            expected(&schema, "", PLAIN_SEPARATOR, &mut want);
            want.sort();

            prop_assert_eq!(keys(&map), want);
        }
    }
}
