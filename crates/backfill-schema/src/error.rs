/// Errors raised while declaring or crawling a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema nests deeper than the crawler allows.
    #[error("schema nesting exceeds max depth {max_depth} at {path}")]
    DepthExceeded { path: String, max_depth: usize },

    /// A field name would be ambiguous inside a serialized path.
    #[error("invalid field name {name:?}: {reason}")]
    InvalidFieldName { name: String, reason: String },

    /// A JSON schema declaration could not be interpreted.
    #[error("invalid schema declaration at {field}: {reason}")]
    InvalidDeclaration { field: String, reason: String },

    /// The JSON text itself could not be parsed.
    #[error("schema JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
