//! Schema declarations and reference maps.
//!
//! A [`Schema`] declares which fields of a resource's documents hold
//! identifiers of documents owned by other resources. The [`SchemaCrawler`]
//! flattens it once into a [`ReferenceMap`] keyed by structured
//! [`FieldPath`](backfill_types::FieldPath)s; the map is immutable afterwards
//! and is the only thing the expander consults at request time.
//!
//! # Declaring a schema
//!
//! ```
//! use backfill_schema::{ReferenceMap, Schema};
//!
//! let schema = Schema::new()
//!     .reference("author", "users")
//!     .reference_array("comments", "comments")
//!     .array_of("items", Schema::new().reference("product", "products"));
//!
//! let map = ReferenceMap::build(&schema).unwrap();
//! assert!(map.get_str("items*product").is_some());
//! ```

pub mod crawler;
pub mod error;
pub mod refmap;
pub mod schema;

pub use crawler::{CrawlerConfig, SchemaCrawler};
pub use error::{SchemaError, SchemaResult};
pub use refmap::ReferenceMap;
pub use schema::{Schema, SchemaField};
