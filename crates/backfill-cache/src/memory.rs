use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{CacheError, CacheResult};
use crate::traits::CacheAdapter;

/// In-memory, HashMap-based cache adapter.
///
/// Intended for tests and embedding. Can be switched into an unavailable
/// state to exercise error propagation.
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    unavailable: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().expect("lock poisoned").contains_key(key)
    }

    /// Raw bytes stored under `key`, bypassing availability checks.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().expect("lock poisoned").get(key).cloned()
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> CacheResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("in-memory cache switched off".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheAdapter for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.check()?;
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        self.check()?;
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<bool> {
        self.check()?;
        Ok(self.entries.write().expect("lock poisoned").remove(key).is_some())
    }
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("entry_count", &self.len())
            .finish()
    }
}
