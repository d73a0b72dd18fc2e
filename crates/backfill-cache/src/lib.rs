//! Cache-aside document store with on-demand reference expansion.
//!
//! [`BackfillStore`] keeps serialized documents of one resource in a cache
//! under `{namespace}:{resource}:{primary key}` and expands their reference
//! fields through [`backfill_expand`] when a caller asks for it. The
//! authoritative datastore stays outside: a cache miss returns `None` and the
//! caller falls back to it (or passes a loader to
//! [`BackfillStore::fetch_or_load`]).
//!
//! # Design Rules
//!
//! 1. The cache holds the unexpanded snapshot; expansion happens per read.
//! 2. Missing primary keys are not errors: the operation returns `None`.
//! 3. Undecodable payloads are treated as misses.
//! 4. Only cache adapter failures propagate. Remote expansion failures leave
//!    the field unresolved and never fail the call.

pub mod config;
pub mod error;
pub mod key;
pub mod memory;
pub mod store;
pub mod traits;

pub use config::{BackfillConfig, DEFAULT_PRIMARY_KEY};
pub use error::{CacheError, CacheResult, StoreError, StoreResult};
pub use key::CacheKey;
pub use memory::InMemoryCache;
pub use store::{BackfillStore, BackfillStoreBuilder, ExpandOptions};
pub use traits::CacheAdapter;
