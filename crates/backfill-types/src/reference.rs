use serde::{Deserialize, Serialize};

/// What a reference field points at.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceDescriptor {
    /// Resource collection owning the referenced documents (e.g. `users`).
    pub target: String,
    /// `true` if the field holds an array of identifiers.
    pub is_array: bool,
}

impl ReferenceDescriptor {
    /// A field holding a single identifier.
    pub fn single(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            is_array: false,
        }
    }

    /// A field holding an array of identifiers.
    pub fn array(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            is_array: true,
        }
    }

    /// Remote operation address, `{target}.{operation}`.
    pub fn operation(&self, operation: &str) -> String {
        format!("{}.{}", self.target, operation)
    }
}
