//! Document environment faults.

use thiserror::Error;

use crate::dom::NodeId;

/// Faults raised while reading from a [`DocumentEnv`](crate::DocumentEnv).
///
/// Engines never propagate these; a failed read is treated as "predicate
/// false" or "field absent" at the call site.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("Node {0} is detached from the document")]
    Detached(NodeId),

    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Access denied reading node {0}")]
    AccessDenied(NodeId),

    #[error("Document unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for document reads.
pub type DomResult<T> = Result<T, DomError>;
