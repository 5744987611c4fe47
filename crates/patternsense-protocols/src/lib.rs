//! # patternsense Protocols
//!
//! Shared definitions for the patternsense detection engine. Contains only
//! interfaces and plain records - no engine implementations.
//!
//! ## Core Items
//!
//! - [`DocumentEnv`] - Injected read access to a live document tree
//! - [`DocumentEnvExt`] - Fault-absorbing helpers over any environment
//! - [`Selector`] - CSS-like selectors for candidate discovery
//! - [`Pattern`] / [`GuaranteeLevel`] - What was found and how sure we are
//! - [`PatternSpec`] / [`StructuralRule`] - Per-pattern discovery config
//! - [`DetectionResult`] / [`InferredPattern`] - Records handed to callers

pub mod detection;
pub mod dom;
pub mod dom_ext;
pub mod error;
pub mod inference;
pub mod pattern;
pub mod pattern_spec;
pub mod selector;

#[cfg(test)]
mod test_support;

pub use detection::{Components, DetectionResult, Evidence, PhraseKind, PhraseMatch, SignatureSummary};
pub use dom::{ComputedStyle, DocumentEnv, FormState, NodeId, Rect, ScrollMetrics, Viewport};
pub use dom_ext::DocumentEnvExt;
pub use error::{ActionError, DomError, DomResult, SelectorError};
pub use inference::{
    InferredPattern, InteractionEvent, InteractionKind, MutationBatch, MutationKind, MutationRecord,
};
pub use pattern::{GuaranteeLevel, Pattern};
pub use pattern_spec::{PatternSpec, StructuralRule};
pub use selector::Selector;
