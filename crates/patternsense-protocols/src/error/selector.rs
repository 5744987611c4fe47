//! Selector parse errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Empty selector")]
    Empty,

    #[error("Unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },

    #[error("Unterminated attribute selector starting at position {0}")]
    UnterminatedAttribute(usize),

    #[error("Unterminated quoted value starting at position {0}")]
    UnterminatedQuote(usize),

    #[error("Missing name at position {0}")]
    MissingName(usize),
}
