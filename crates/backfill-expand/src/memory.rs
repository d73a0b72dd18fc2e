use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use backfill_types::key_fragment;

use crate::error::{TransportError, TransportResult};
use crate::transport::RemoteTransport;

/// A call observed by [`InMemoryTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: String,
    pub argument: Value,
    pub delegate_expand: String,
}

/// In-memory transport serving documents from per-resource tables.
///
/// Intended for tests and embedding. Every call is recorded. Individual
/// identifiers can be made to fail or to respond after a delay.
pub struct InMemoryTransport {
    resources: RwLock<HashMap<String, HashMap<String, Value>>>,
    failing: RwLock<HashSet<(String, String)>>,
    delays: RwLock<HashMap<(String, String), Duration>>,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            resources: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            delays: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Serve `document` for `resource` / `id`.
    pub fn insert(&self, resource: &str, id: &str, document: Value) {
        self.resources
            .write()
            .expect("lock poisoned")
            .entry(resource.to_string())
            .or_default()
            .insert(id.to_string(), document);
    }

    /// Make calls for `resource` / `id` fail with a remote error.
    pub fn fail_on(&self, resource: &str, id: &str) {
        self.failing
            .write()
            .expect("lock poisoned")
            .insert((resource.to_string(), id.to_string()));
    }

    /// Delay the response for `resource` / `id`.
    pub fn delay(&self, resource: &str, id: &str, delay: Duration) {
        self.delays
            .write()
            .expect("lock poisoned")
            .insert((resource.to_string(), id.to_string()), delay);
    }

    /// All calls so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    /// Calls addressed to `operation`.
    pub fn calls_to(&self, operation: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }

    /// Highest number of calls that were in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Calls currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, operation: &str, argument: &Value, delegate_expand: &str) {
        self.calls.lock().expect("lock poisoned").push(RecordedCall {
            operation: operation.to_string(),
            argument: argument.clone(),
            delegate_expand: delegate_expand.to_string(),
        });
    }

    fn respond(&self, resource: &str, id: &str) -> TransportResult<Value> {
        let key = (resource.to_string(), id.to_string());
        if self.failing.read().expect("lock poisoned").contains(&key) {
            return Err(TransportError::Remote(format!("{resource} {id} unavailable")));
        }
        self.resources
            .read()
            .expect("lock poisoned")
            .get(resource)
            .and_then(|table| table.get(id))
            .cloned()
            .ok_or_else(|| TransportError::Remote(format!("{resource} {id} not found")))
    }
}

/// Counts a call as in flight until dropped, so cancelled calls are released.
struct InFlight<'a> {
    count: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = count.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { count }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteTransport for InMemoryTransport {
    async fn call(
        &self,
        operation: &str,
        argument: Value,
        delegate_expand: &str,
    ) -> TransportResult<Value> {
        self.record(operation, &argument, delegate_expand);

        let (resource, _) = operation
            .rsplit_once('.')
            .ok_or_else(|| TransportError::Unavailable(format!("malformed operation {operation}")))?;
        let id = key_fragment(Some(&argument))
            .ok_or_else(|| TransportError::Remote(format!("unusable identifier {argument}")))?;

        let _guard = InFlight::enter(&self.in_flight, &self.peak_in_flight);

        let delay = self
            .delays
            .read()
            .expect("lock poisoned")
            .get(&(resource.to_string(), id.clone()))
            .copied();
        // Yield at least once so concurrent callers overlap.
        match delay {
            Some(d) => tokio::time::sleep(d).await,
            None => tokio::task::yield_now().await,
        }

        self.respond(resource, &id)
    }
}

impl std::fmt::Debug for InMemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let resources = self.resources.read().expect("lock poisoned").len();
        f.debug_struct("InMemoryTransport")
            .field("resource_count", &resources)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn serves_inserted_documents() {
        let t = InMemoryTransport::new();
        t.insert("users", "u1", json!({"_id": "u1", "name": "Ada"}));

        let doc = t.call("users.read", json!("u1"), "").await.unwrap();
        assert_eq!(doc["name"], "Ada");
        assert_eq!(
            t.calls(),
            vec![RecordedCall {
                operation: "users.read".into(),
                argument: json!("u1"),
                delegate_expand: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn unknown_and_failing_ids_error() {
        let t = InMemoryTransport::new();
        t.insert("users", "u1", json!({"_id": "u1"}));
        t.fail_on("users", "u1");

        assert!(matches!(
            t.call("users.read", json!("u1"), "").await,
            Err(TransportError::Remote(_))
        ));
        assert!(t.call("users.read", json!("nope"), "").await.is_err());
        assert!(matches!(
            t.call("noop", json!("u1"), "").await,
            Err(TransportError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_calls_leave_flight() {
        let t = InMemoryTransport::new();
        t.insert("users", "u1", json!({"_id": "u1"}));
        t.delay("users", "u1", Duration::from_millis(200));

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), t.call("users.read", json!("u1"), "")).await;
        assert!(cancelled.is_err());
        assert_eq!(t.in_flight(), 0);
        assert_eq!(t.peak_in_flight(), 1);

        t.call("users.read", json!("u1"), "").await.unwrap();
        assert_eq!(t.in_flight(), 0);
        assert_eq!(t.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn numeric_ids_are_looked_up_by_text() {
        let t = InMemoryTransport::new();
        t.insert("orders", "7", json!({"_id": 7}));
        let doc = t.call("orders.read", json!(7), "").await.unwrap();
        assert_eq!(doc["_id"], 7);
    }
}
