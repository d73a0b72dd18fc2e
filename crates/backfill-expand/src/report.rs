use std::collections::BTreeMap;

use serde::Serialize;

use backfill_types::FieldPath;

/// Outcome of one expansion job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum FieldStatus {
    /// The field now holds the fetched document(s).
    Resolved,
    /// No call was needed or the shape was not expandable; the field is
    /// unchanged.
    Skipped(String),
    /// A remote call failed; the field still holds its identifier(s).
    Failed(String),
}

/// Per-field outcome of an expansion, keyed by local reference path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExpansionReport {
    fields: BTreeMap<FieldPath, FieldStatus>,
}

impl ExpansionReport {
    pub(crate) fn record(&mut self, path: FieldPath, status: FieldStatus) {
        self.fields.insert(path, status);
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldStatus> {
        self.fields.get(path)
    }

    /// Status for a path given in serialized form.
    pub fn get_str(&self, path: &str) -> Option<&FieldStatus> {
        FieldPath::parse(path).ok().and_then(|p| self.fields.get(&p))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldStatus)> {
        self.fields.iter()
    }

    /// Fields whose remote calls failed.
    pub fn failures(&self) -> impl Iterator<Item = (&FieldPath, &str)> {
        self.fields.iter().filter_map(|(p, s)| match s {
            FieldStatus::Failed(reason) => Some((p, reason.as_str())),
            _ => None,
        })
    }

    pub fn resolved_count(&self) -> usize {
        self.fields
            .values()
            .filter(|s| matches!(s, FieldStatus::Resolved))
            .count()
    }

    /// `true` when no job failed.
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_failures() {
        let mut r = ExpansionReport::default();
        r.record(FieldPath::root("author"), FieldStatus::Resolved);
        r.record(FieldPath::root("editor"), FieldStatus::Failed("boom".into()));
        r.record(FieldPath::root("tags"), FieldStatus::Skipped("empty".into()));

        assert_eq!(r.len(), 3);
        assert_eq!(r.resolved_count(), 1);
        assert!(!r.is_complete());
        let failures: Vec<_> = r.failures().map(|(p, why)| (p.to_string(), why)).collect();
        assert_eq!(failures, vec![("editor".to_string(), "boom")]);
    }

    #[test]
    fn serializes_by_path() {
        let mut r = ExpansionReport::default();
        r.record(FieldPath::parse("items*product").unwrap(), FieldStatus::Resolved);
        r.record(FieldPath::root("author"), FieldStatus::Failed("boom".into()));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["items*product"]["status"], "resolved");
        assert_eq!(json["author"]["status"], "failed");
        assert_eq!(json["author"]["reason"], "boom");
    }
}
