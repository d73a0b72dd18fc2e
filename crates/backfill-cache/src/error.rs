use backfill_schema::SchemaError;

/// Failures of a [`CacheAdapter`](crate::CacheAdapter).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache backend cannot be reached.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the underlying backend.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for cache adapter operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors from [`BackfillStore`](crate::BackfillStore) construction and
/// operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required collaborator or setting is missing. Raised at construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The schema could not be crawled into a reference map.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The TOML configuration could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The cache adapter failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A document could not be turned into a plain record.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The caller-supplied loader failed.
    #[error("load error: {0}")]
    Load(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
