//! Errors surfaced by actions executed under verification.

use thiserror::Error;

/// An interaction performed by the host while a verifier watches.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Action failed: {0}")]
    Failed(String),

    #[error("Action target not found: {0}")]
    TargetNotFound(String),

    #[error("Action panicked: {0}")]
    Panicked(String),
}
