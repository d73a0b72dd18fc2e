//! Structured field paths.
//!
//! Externally a path is written as field names joined by `.` (plain object
//! nesting) or `*` (a hop across an array of sub-records), e.g.
//! `meta.owner` or `items*product`. Internally it is an ordered list of
//! [`PathStep`]s so that lookups never have to re-split strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PathError, Result};

/// Separator for plain object nesting.
pub const PLAIN_SEPARATOR: char = '.';

/// Separator marking a step across an array-of-objects boundary.
pub const ARRAY_HOP: char = '*';

/// A single step of a [`FieldPath`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathStep {
    /// Field name at this level.
    pub name: String,
    /// `true` if this step is entered by crossing into the elements of the
    /// previous step's array.
    pub array_hop: bool,
}

impl PathStep {
    /// A step reached through plain object nesting.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array_hop: false,
        }
    }

    /// A step reached by hopping into the elements of an array.
    pub fn hop(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array_hop: true,
        }
    }
}

/// Ordered path of field names from the document root.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    steps: Vec<PathStep>,
}

impl FieldPath {
    /// A single-step path naming a top-level field.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            steps: vec![PathStep::plain(name)],
        }
    }

    /// Build a path from explicit steps. The first step never carries an
    /// array hop; it is normalised away if set.
    pub fn from_steps(mut steps: Vec<PathStep>) -> Self {
        if let Some(first) = steps.first_mut() {
            first.array_hop = false;
        }
        Self { steps }
    }

    /// Extend with a plain nested field.
    pub fn child(&self, name: impl Into<String>) -> Self {
        self.extend(PathStep::plain(name))
    }

    /// Extend with a field inside each element of this path's array.
    pub fn hop(&self, name: impl Into<String>) -> Self {
        self.extend(PathStep::hop(name))
    }

    /// Extend with a step, treating an empty path as the root.
    pub fn extend(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self::from_steps(steps)
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Name of the first (top-level) field.
    pub fn head(&self) -> Option<&str> {
        self.steps.first().map(|s| s.name.as_str())
    }

    /// Number of array hops along the path.
    pub fn array_hops(&self) -> usize {
        self.steps.iter().filter(|s| s.array_hop).count()
    }

    pub fn has_array_hop(&self) -> bool {
        self.array_hops() > 0
    }

    /// Split at the first array hop into the path of the array field and the
    /// path inside each element (re-rooted, so its first step is plain).
    ///
    /// Returns `None` when the path has no array hop.
    pub fn split_at_hop(&self) -> Option<(FieldPath, FieldPath)> {
        let idx = self.steps.iter().position(|s| s.array_hop)?;
        let array = FieldPath {
            steps: self.steps[..idx].to_vec(),
        };
        let element = FieldPath::from_steps(self.steps[idx..].to_vec());
        Some((array, element))
    }

    /// Parse the external dotted/starred form.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }

        let mut steps = Vec::new();
        let mut current = String::new();
        let mut hop = false;

        for (pos, ch) in input.char_indices() {
            if ch == PLAIN_SEPARATOR || ch == ARRAY_HOP {
                if current.is_empty() {
                    return Err(PathError::EmptySegment {
                        path: input.to_string(),
                        position: pos,
                    });
                }
                steps.push(PathStep {
                    name: std::mem::take(&mut current),
                    array_hop: hop,
                });
                hop = ch == ARRAY_HOP;
            } else {
                current.push(ch);
            }
        }

        if current.is_empty() {
            return Err(PathError::EmptySegment {
                path: input.to_string(),
                position: input.len(),
            });
        }
        steps.push(PathStep {
            name: current,
            array_hop: hop,
        });

        Ok(Self::from_steps(steps))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                let sep = if step.array_hop { ARRAY_HOP } else { PLAIN_SEPARATOR };
                write!(f, "{sep}")?;
            }
            f.write_str(&step.name)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FieldPath::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_single_field() {
        let p = FieldPath::parse("author").unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.head(), Some("author"));
        assert!(!p.has_array_hop());
    }

    #[test]
    fn parse_mixed_separators() {
        let p = FieldPath::parse("meta.items*product").unwrap();
        assert_eq!(
            p.steps(),
            &[
                PathStep::plain("meta"),
                PathStep::plain("items"),
                PathStep::hop("product"),
            ]
        );
        assert_eq!(p.array_hops(), 1);
    }

    #[test]
    fn display_matches_input() {
        for s in ["a", "a.b", "a*b", "a*b.c*d"] {
            assert_eq!(FieldPath::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn builder_matches_parser() {
        let built = FieldPath::root("items").hop("product").child("sku");
        assert_eq!(built, "items*product.sku".parse().unwrap());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
    }

    #[test]
    fn rejects_empty_segments() {
        for s in [".a", "a.", "a..b", "a*.b", "*a"] {
            assert!(
                matches!(FieldPath::parse(s), Err(PathError::EmptySegment { .. })),
                "{s} should be rejected"
            );
        }
    }

    #[test]
    fn first_step_never_hops() {
        let p = FieldPath::from_steps(vec![PathStep::hop("a"), PathStep::hop("b")]);
        assert!(!p.steps()[0].array_hop);
        assert_eq!(p.to_string(), "a*b");
    }

    #[test]
    fn split_at_hop() {
        let p = FieldPath::parse("meta.items*product.sku").unwrap();
        let (array, element) = p.split_at_hop().unwrap();
        assert_eq!(array.to_string(), "meta.items");
        assert_eq!(element.to_string(), "product.sku");

        assert!(FieldPath::parse("a.b").unwrap().split_at_hop().is_none());
    }

    #[test]
    fn serde_as_string() {
        let p = FieldPath::parse("items*product").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"items*product\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    proptest! {
        #[test]
        fn parse_display_stable(
            names in proptest::collection::vec("[a-z_][a-z0-9_]{0,6}", 1..5),
            hops in proptest::collection::vec(any::<bool>(), 5),
        ) {
            let mut s = names[0].clone();
            for (i, name) in names.iter().enumerate().skip(1) {
                s.push(if hops[i] { ARRAY_HOP } else { PLAIN_SEPARATOR });
                s.push_str(name);
            }
            let p = FieldPath::parse(&s).unwrap();
            prop_assert_eq!(p.len(), names.len());
            prop_assert_eq!(p.to_string(), s);
        }
    }
}
