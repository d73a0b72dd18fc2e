use std::time::Duration;

use thiserror::Error;

/// Failures reported by a [`RemoteTransport`](crate::RemoteTransport).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("remote error: {0}")]
    Remote(String),

    #[error("transport error: {0}")]
    Unavailable(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Per-field expansion failures. These are recorded and logged, never
/// returned from [`Expander::expand`](crate::Expander::expand).
#[derive(Debug, Clone, Error)]
pub enum ExpandError {
    #[error("remote call {operation} failed: {source}")]
    Remote {
        operation: String,
        #[source]
        source: TransportError,
    },

    #[error("remote call {operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },

    #[error("unsupported shape at {path}: {reason}")]
    UnsupportedShape { path: String, reason: String },
}

pub type ExpandResult<T> = Result<T, ExpandError>;
