use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use backfill_schema::ReferenceMap;
use backfill_types::{FieldPath, ReferenceDescriptor, PLAIN_SEPARATOR};

use crate::neutralizer::{Neutralizer, CLAUSE_SEPARATOR};

/// How a job's field is shaped in the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    /// One identifier, one remote call.
    Scalar,
    /// An array of identifiers, one remote call per element.
    Array,
    /// An array of sub-records whose sub-field holds the identifier.
    WildcardArray,
}

/// One remote expansion of a local reference field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpansionJob {
    pub path: FieldPath,
    pub reference: ReferenceDescriptor,
    /// Fragments forwarded to the owning service, joined with `,` at dispatch.
    pub delegate_expand: BTreeSet<String>,
}

impl ExpansionJob {
    fn new(path: FieldPath, reference: ReferenceDescriptor) -> Self {
        Self {
            path,
            reference,
            delegate_expand: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> JobKind {
        if self.path.has_array_hop() {
            JobKind::WildcardArray
        } else if self.reference.is_array {
            JobKind::Array
        } else {
            JobKind::Scalar
        }
    }

    /// The delegate expansion expression sent with every call of this job.
    pub fn delegate_expression(&self) -> String {
        let separator = CLAUSE_SEPARATOR.to_string();
        let fragments: Vec<&str> = self.delegate_expand.iter().map(String::as_str).collect();
        fragments.join(separator.as_str())
    }
}

/// The set of jobs for one expansion request, at most one per local path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpansionPlan {
    jobs: BTreeMap<FieldPath, ExpansionJob>,
}

impl ExpansionPlan {
    /// Neutralize and resolve an expression in one step.
    pub fn from_expression(references: &ReferenceMap, expression: &str) -> Self {
        Resolver::new(references).resolve(&Neutralizer::neutralize(expression))
    }

    pub fn get(&self, path: &FieldPath) -> Option<&ExpansionJob> {
        self.jobs.get(path)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &ExpansionJob> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn merge(&mut self, path: FieldPath, reference: &ReferenceDescriptor, fragment: Option<&str>) {
        let job = self
            .jobs
            .entry(path.clone())
            .or_insert_with(|| ExpansionJob::new(path, reference.clone()));
        if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
            job.delegate_expand.insert(fragment.to_string());
        }
    }
}

/// Maps neutralized clauses onto a [`ReferenceMap`].
pub struct Resolver<'a> {
    references: &'a ReferenceMap,
}

impl<'a> Resolver<'a> {
    pub fn new(references: &'a ReferenceMap) -> Self {
        Self { references }
    }

    /// Resolve clauses into a plan.
    ///
    /// A clause naming a reference path exactly becomes a job. Otherwise the
    /// clause is split at its first `.`: if the head is a reference path, the
    /// remainder is added to that job's delegate expansion. Anything else is
    /// not a reference of this resource and is dropped.
    pub fn resolve<S: AsRef<str>>(&self, clauses: &[S]) -> ExpansionPlan {
        let mut plan = ExpansionPlan::default();

        for clause in clauses {
            let clause = clause.as_ref();

            if let Some((path, reference)) = self.lookup(clause) {
                plan.merge(path, reference, None);
                continue;
            }

            let resolved = clause
                .split_once(PLAIN_SEPARATOR)
                .and_then(|(head, rest)| self.lookup(head).map(|found| (found, rest)));

            match resolved {
                Some(((path, reference), rest)) => plan.merge(path, reference, Some(rest)),
                None => debug!(clause, "expand clause matches no reference; dropped"),
            }
        }

        plan
    }

    fn lookup(&self, path: &str) -> Option<(FieldPath, &'a ReferenceDescriptor)> {
        let path = FieldPath::parse(path).ok()?;
        let reference = self.references.get(&path)?;
        Some((path, reference))
    }
}
