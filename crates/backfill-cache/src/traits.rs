use async_trait::async_trait;

use crate::error::CacheResult;

/// Byte-oriented cache backend (e.g. Redis, Memcached, in-process maps).
///
/// The store never sets expiry; TTL policy, if any, belongs to the adapter.
#[async_trait]
pub trait CacheAdapter: Send + Sync {
    /// Read the value stored under `key`. `Ok(None)` if absent.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()>;

    /// Delete `key`. Returns `true` if it existed.
    async fn del(&self, key: &str) -> CacheResult<bool>;
}
