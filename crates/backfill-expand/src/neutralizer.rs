use std::cmp::Reverse;

use backfill_types::{ARRAY_HOP, PLAIN_SEPARATOR};

/// Clause separator in an expansion expression.
pub const CLAUSE_SEPARATOR: char = ',';

/// Stands in for [`ARRAY_HOP`] while clauses are compared.
pub const HOP_FILLER: char = '_';

/// Reduces an expansion expression to a minimal set of clauses.
///
/// A clause is dropped when an equal clause was already kept, or when it is a
/// strict parent of a kept clause (`a` is a parent of `a.b`). Clauses are
/// visited in reverse lexicographic order, so children are always kept before
/// their parents are considered. The nested part of a dropped parent's child
/// later becomes a delegate expansion on the parent's job, so both are still
/// expanded by one remote call.
pub struct Neutralizer;

impl Neutralizer {
    /// Split an expression into clauses, removing all whitespace and empty
    /// clauses.
    pub fn split(expression: &str) -> Vec<String> {
        expression
            .split(CLAUSE_SEPARATOR)
            .map(|clause| clause.chars().filter(|c| !c.is_whitespace()).collect::<String>())
            .filter(|clause| !clause.is_empty())
            .collect()
    }

    /// Neutralize a raw expansion expression.
    pub fn neutralize(expression: &str) -> Vec<String> {
        Self::neutralize_clauses(Self::split(expression))
    }

    /// Neutralize pre-split clauses. The result is in reverse lexicographic
    /// order of the masked clauses; running it through again returns it
    /// unchanged.
    pub fn neutralize_clauses<I, S>(clauses: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut candidates: Vec<String> = clauses.into_iter().map(Into::into).collect();
        candidates.sort_by_cached_key(|c| Reverse((mask(c), c.clone())));

        let mut kept: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !kept.iter().any(|k| covers(&candidate, k)) {
                kept.push(candidate);
            }
        }
        kept
    }
}

/// `true` if `candidate` equals `kept` or is its strict parent.
///
/// Array hops are masked with [`HOP_FILLER`] on both sides first, so only `.`
/// counts as a boundary: `items` is not a parent of `items*product`.
fn covers(candidate: &str, kept: &str) -> bool {
    let candidate = mask(candidate);
    let kept = mask(kept);
    match kept.strip_prefix(candidate.as_str()) {
        Some("") => true,
        Some(rest) => rest.starts_with(PLAIN_SEPARATOR),
        None => false,
    }
}

fn mask(clause: &str) -> String {
    clause.replace(ARRAY_HOP, &HOP_FILLER.to_string())
}
