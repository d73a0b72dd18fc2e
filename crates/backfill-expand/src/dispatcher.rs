//! Remote fetch dispatcher.
//!
//! Runs every job of an [`ExpansionPlan`] concurrently, then applies all
//! results to the document in a single pass. Jobs only read the document
//! while in flight, so no job can observe another job's partial writes.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use backfill_types::{is_empty_value, lookup, lookup_mut, Document, FieldPath};

use crate::config::DispatchConfig;
use crate::error::{ExpandError, ExpandResult};
use crate::report::{ExpansionReport, FieldStatus};
use crate::resolver::{ExpansionJob, ExpansionPlan, JobKind};
use crate::transport::RemoteTransport;

/// A job that settled without a remote failure.
enum Settled {
    /// Replace the value at `target` (the job's field, or the top-level array
    /// for wildcard jobs).
    Replace { target: FieldPath, value: Value },
    Skip(String),
}

/// Executes expansion jobs against a [`RemoteTransport`].
pub struct Dispatcher {
    transport: Arc<dyn RemoteTransport>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn RemoteTransport>, config: DispatchConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run `plan` against `doc` and return the expanded document.
    ///
    /// Never fails: a job whose remote call fails leaves its field untouched
    /// and is reported as [`FieldStatus::Failed`].
    pub async fn dispatch(
        &self,
        mut doc: Document,
        plan: &ExpansionPlan,
    ) -> (Document, ExpansionReport) {
        let mut report = ExpansionReport::default();
        if plan.is_empty() {
            return (doc, report);
        }

        debug!(jobs = plan.len(), "dispatching expansion jobs");
        let outcomes = join_all(plan.jobs().map(|job| self.run_job(&doc, job))).await;

        // Wildcard jobs over the same array would each replace it wholesale;
        // the first one in plan order wins.
        let mut written: HashMap<FieldPath, FieldPath> = HashMap::new();

        for (job, outcome) in plan.jobs().zip(outcomes) {
            let status = match outcome {
                Ok(Settled::Replace { target, value }) => {
                    if let Some(owner) = written.get(&target) {
                        FieldStatus::Skipped(format!("{target} already replaced by {owner}"))
                    } else if let Some(slot) = lookup_mut(&mut doc, &target) {
                        *slot = value;
                        debug!(field = %job.path, "field expanded");
                        written.insert(target, job.path.clone());
                        FieldStatus::Resolved
                    } else {
                        FieldStatus::Skipped(format!("{target} is not present"))
                    }
                }
                Ok(Settled::Skip(reason)) => FieldStatus::Skipped(reason),
                Err(e) => {
                    warn!(field = %job.path, error = %e, "expansion failed; field left unresolved");
                    FieldStatus::Failed(e.to_string())
                }
            };
            report.record(job.path.clone(), status);
        }

        (doc, report)
    }

    async fn run_job(&self, doc: &Document, job: &ExpansionJob) -> ExpandResult<Settled> {
        let operation = job.reference.operation(&self.config.fetch_operation);
        let delegate = job.delegate_expression();

        match job.kind() {
            JobKind::Scalar => {
                let value = match lookup(doc, &job.path) {
                    Some(value) if !is_empty_value(Some(value)) => value.clone(),
                    _ => return Ok(empty()),
                };
                let value = self.call(&operation, value, &delegate).await?;
                Ok(Settled::Replace {
                    target: job.path.clone(),
                    value,
                })
            }
            JobKind::Array => {
                let items = match lookup(doc, &job.path) {
                    Some(Value::Array(items)) if !items.is_empty() => items,
                    value if is_empty_value(value) => return Ok(empty()),
                    _ => return Ok(unsupported(&job.path, "expected an array of identifiers")),
                };
                let resolved = self
                    .resolve_each(&operation, &delegate, items, |_, item| {
                        (!is_empty_value(Some(item))).then(|| item.clone())
                    })
                    .await?;
                Ok(match resolved {
                    Some(value) => Settled::Replace {
                        target: job.path.clone(),
                        value,
                    },
                    None => empty(),
                })
            }
            JobKind::WildcardArray => {
                if job.path.array_hops() > 1 {
                    return Ok(unsupported(&job.path, "more than one array hop"));
                }
                if job.reference.is_array {
                    return Ok(unsupported(&job.path, "array reference inside an array of records"));
                }
                let Some((array_path, element_path)) = job.path.split_at_hop() else {
                    return Ok(empty());
                };
                let items = match lookup(doc, &array_path) {
                    Some(Value::Array(items)) if !items.is_empty() => items,
                    value if is_empty_value(value) => return Ok(empty()),
                    _ => return Ok(unsupported(&array_path, "expected an array of records")),
                };
                let resolved = self
                    .resolve_each(&operation, &delegate, items, |index, item| match item {
                        Value::Object(record) => lookup(record, &element_path)
                            .filter(|key| !is_empty_value(Some(*key)))
                            .cloned(),
                        Value::Array(_) => {
                            let e = ExpandError::UnsupportedShape {
                                path: job.path.to_string(),
                                reason: format!("element {index} is a nested list"),
                            };
                            warn!(error = %e, "element skipped");
                            None
                        }
                        _ => None,
                    })
                    .await?;
                Ok(match resolved {
                    Some(value) => Settled::Replace {
                        target: array_path,
                        value,
                    },
                    None => empty(),
                })
            }
        }
    }

    /// Fetch every element for which `key_of` yields an identifier, at most
    /// `max_concurrency_per_job` at a time, and return the array with those
    /// elements replaced in their original positions.
    ///
    /// Returns `Ok(None)` when no element needs a call. The first failing call
    /// fails the whole array.
    async fn resolve_each<F>(
        &self,
        operation: &str,
        delegate: &str,
        items: &[Value],
        key_of: F,
    ) -> ExpandResult<Option<Value>>
    where
        F: Fn(usize, &Value) -> Option<Value> + Send,
    {
        let keyed: Vec<(usize, Value)> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| key_of(index, item).map(|key| (index, key)))
            .collect();
        if keyed.is_empty() {
            return Ok(None);
        }

        let fetched: Vec<Value> = stream::iter(
            keyed
                .iter()
                .map(|(_, key)| self.call(operation, key.clone(), delegate)),
        )
        .buffered(self.config.concurrency())
        .try_collect()
        .await?;

        let mut resolved = items.to_vec();
        for ((index, _), value) in keyed.iter().zip(fetched) {
            resolved[*index] = value;
        }
        Ok(Some(Value::Array(resolved)))
    }

    async fn call(&self, operation: &str, argument: Value, delegate: &str) -> ExpandResult<Value> {
        let request = self.transport.call(operation, argument, delegate);
        let response = match self.config.call_timeout() {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| ExpandError::Timeout {
                    operation: operation.to_string(),
                    timeout: limit,
                })?,
            None => request.await,
        };
        response.map_err(|source| ExpandError::Remote {
            operation: operation.to_string(),
            source,
        })
    }
}

fn empty() -> Settled {
    Settled::Skip("no identifier to expand".into())
}

fn unsupported(path: &FieldPath, reason: &str) -> Settled {
    let e = ExpandError::UnsupportedShape {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    warn!(error = %e, "expansion skipped");
    Settled::Skip(e.to_string())
}
