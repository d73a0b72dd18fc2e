use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportResult;

/// Remote-call transport to the services owning referenced resources.
///
/// `operation` is addressed as `{resource}.{operation_name}`, e.g.
/// `users.read`. `delegate_expand` is an expansion expression forwarded to the
/// remote service so it can expand its own references in the same call; it is
/// empty when there is nothing to delegate.
///
/// Deadlines and cancellation beyond [`DispatchConfig::call_timeout`] are the
/// transport's concern.
///
/// [`DispatchConfig::call_timeout`]: crate::DispatchConfig::call_timeout
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn call(
        &self,
        operation: &str,
        argument: Value,
        delegate_expand: &str,
    ) -> TransportResult<Value>;
}
