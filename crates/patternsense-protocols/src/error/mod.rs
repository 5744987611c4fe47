//! Error types for the patternsense protocol layer.

mod action;
mod dom;
mod selector;

pub use action::*;
pub use dom::*;
pub use selector::*;
