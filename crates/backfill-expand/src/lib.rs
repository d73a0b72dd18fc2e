//! Reference expansion ("backfill") for documents.
//!
//! Given a document and a caller-supplied expansion expression such as
//! `author.profile,comments`, the [`Expander`] replaces reference fields with
//! the documents they point at by calling the services that own them.
//!
//! # Pipeline
//!
//! 1. [`Neutralizer`] -- reduces the expression to clauses with no redundant
//!    prefix relationships
//! 2. [`Resolver`] -- maps clauses onto the [`ReferenceMap`] as an
//!    [`ExpansionPlan`] of one [`ExpansionJob`] per local reference field,
//!    folding deeper segments into delegate expansions
//! 3. [`Dispatcher`] -- runs every job concurrently against a
//!    [`RemoteTransport`] and applies the results to the document in one pass
//!
//! Steps 1 and 2 are synchronous. Remote failures never fail the expansion:
//! the affected field keeps its identifier and the failure is recorded in the
//! [`ExpansionReport`].
//!
//! [`ReferenceMap`]: backfill_schema::ReferenceMap

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod expander;
pub mod memory;
pub mod neutralizer;
pub mod report;
pub mod resolver;
pub mod transport;

pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use error::{ExpandError, ExpandResult, TransportError, TransportResult};
pub use expander::Expander;
pub use memory::{InMemoryTransport, RecordedCall};
pub use neutralizer::Neutralizer;
pub use report::{ExpansionReport, FieldStatus};
pub use resolver::{ExpansionJob, ExpansionPlan, JobKind, Resolver};
pub use transport::RemoteTransport;
