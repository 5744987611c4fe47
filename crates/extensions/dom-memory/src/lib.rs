//! In-memory document environment for patternsense.
//!
//! Builds a [`DocumentEnv`](patternsense_protocols::DocumentEnv) from JSON
//! fixtures (see [`fixture`]) and lets callers edit it the way a page would
//! mutate: attributes toggle, children are appended or removed, controls get
//! typed into. Edits that a mutation observer would see are recorded and
//! drained as [`MutationBatch`](patternsense_protocols::MutationBatch)es, so
//! the correlation engine can be fed exactly what a live host would deliver.

mod document;
mod error;
pub mod fixture;

pub use document::MemoryDocument;
pub use error::MemoryDocError;
pub use fixture::{DocumentSpec, NodeSpec};
