//! In-memory document errors.

use patternsense_protocols::{DomError, NodeId};
use thiserror::Error;

/// Errors raised while loading or editing a [`MemoryDocument`](crate::MemoryDocument).
#[derive(Debug, Error)]
pub enum MemoryDocError {
    /// IO error while reading a fixture.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture JSON did not describe a document.
    #[error("Failed to parse document fixture: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The node was removed from the tree.
    #[error("Node is detached: {0}")]
    Detached(NodeId),

    /// Removing the root would leave no document.
    #[error("Cannot remove the document root")]
    RootRemoval,

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl From<MemoryDocError> for DomError {
    fn from(err: MemoryDocError) -> Self {
        match err {
            MemoryDocError::NodeNotFound(id) => DomError::NotFound(id),
            MemoryDocError::Detached(id) => DomError::Detached(id),
            MemoryDocError::Dom(inner) => inner,
            other => DomError::Unavailable(other.to_string()),
        }
    }
}
