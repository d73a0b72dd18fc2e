/// Errors produced while parsing field paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path string contained no segments at all.
    #[error("field path must not be empty")]
    Empty,

    /// A separator was not followed (or preceded) by a field name.
    #[error("empty segment at byte {position} in field path {path:?}")]
    EmptySegment { path: String, position: usize },
}

/// Convenience alias used throughout the types crate.
pub type Result<T> = std::result::Result<T, PathError>;
