//! Foundation types for backfill.
//!
//! Every other backfill crate depends on `backfill-types`. The types here are
//! deliberately small: they describe *where* a reference lives inside a
//! document and *what* it points at, without knowing anything about caches or
//! remote services.
//!
//! # Key Types
//!
//! - [`FieldPath`] -- Structured path into a document, one [`PathStep`] per field
//! - [`ReferenceDescriptor`] -- Target resource of a reference field and its arity
//! - [`Document`] -- Untyped record (field name to JSON value)

pub mod document;
pub mod error;
pub mod path;
pub mod reference;

pub use document::{is_empty_value, key_fragment, lookup, lookup_mut, Document};
pub use error::{PathError, Result};
pub use path::{FieldPath, PathStep, ARRAY_HOP, PLAIN_SEPARATOR};
pub use reference::ReferenceDescriptor;
