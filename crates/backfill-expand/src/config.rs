use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Operation name used when none is configured.
pub const DEFAULT_FETCH_OPERATION: &str = "read";

/// Configuration for the [`Dispatcher`](crate::Dispatcher).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Operation invoked on the owning resource, addressed as
    /// `{resource}.{fetch_operation}`.
    pub fetch_operation: String,
    /// Maximum in-flight remote calls per job (array elements). Values below
    /// one are treated as one.
    pub max_concurrency_per_job: usize,
    /// Per-call deadline in milliseconds. `None` or `0` leaves deadlines to
    /// the transport.
    pub call_timeout_ms: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            fetch_operation: DEFAULT_FETCH_OPERATION.to_string(),
            max_concurrency_per_job: 16,
            call_timeout_ms: None,
        }
    }
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remote operation name.
    pub fn with_fetch_operation(mut self, operation: impl Into<String>) -> Self {
        self.fetch_operation = operation.into();
        self
    }

    /// Set the per-job concurrency cap.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency_per_job = max;
        self
    }

    /// Set the per-call timeout. Saturates at `u64::MAX` milliseconds; a zero
    /// duration disables the timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub(crate) fn concurrency(&self) -> usize {
        self.max_concurrency_per_job.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DispatchConfig::default();
        assert_eq!(c.fetch_operation, "read");
        assert_eq!(c.max_concurrency_per_job, 16);
        assert!(c.call_timeout().is_none());
    }

    #[test]
    fn concurrency_never_zero() {
        assert_eq!(DispatchConfig::new().with_max_concurrency(0).concurrency(), 1);
    }

    #[test]
    fn timeout_roundtrips_through_millis() {
        let c = DispatchConfig::new().with_call_timeout(Duration::from_millis(250));
        assert_eq!(c.call_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn zero_timeout_is_disabled() {
        assert!(DispatchConfig::new().with_call_timeout(Duration::ZERO).call_timeout().is_none());
        let c: DispatchConfig = serde_json::from_str(r#"{"call_timeout_ms": 0}"#).unwrap();
        assert!(c.call_timeout().is_none());
    }

    #[test]
    fn huge_timeout_saturates() {
        let c = DispatchConfig::new().with_call_timeout(Duration::MAX);
        assert_eq!(c.call_timeout_ms, Some(u64::MAX));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let c: DispatchConfig = serde_json::from_str(r#"{"fetch_operation": "get"}"#).unwrap();
        assert_eq!(c.fetch_operation, "get");
        assert_eq!(c.max_concurrency_per_job, 16);
    }
}
