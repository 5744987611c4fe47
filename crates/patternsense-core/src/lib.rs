//! # patternsense core
//!
//! Engines that classify regions of a live document as interaction patterns
//! and verify that a bound region behaves like one.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        PatternDetector                           │
//! │   candidates ─► structural ─┬─ phrasal (PhrasalScorer)           │
//! │                             ├─ semantic                          │
//! │                             └─ behavioral ─► confidence          │
//! │                                   │                              │
//! │                                   └─► StructuralHasher (LSH)     │
//! └──────────────────────────────────────────────────────────────────┘
//!   SnapshotDiffer        CorrelationEngine        BehaviorVerifier
//!   value snapshots       action + mutation        pre / act / post
//!   and quick rules       windowed inference       guarantee upgrade
//! ```
//!
//! ## Key Components
//!
//! - [`SnapshotDiffer`]: point-in-time value snapshots and categorized diffs
//! - [`PhrasalScorer`]: per-pattern phrase lexicon scoring
//! - [`StructuralHasher`]: MinHash signatures and a banded similarity index
//! - [`PatternDetector`]: four-signal confidence classifier
//! - [`CorrelationEngine`]: passive action/mutation correlation
//! - [`BehaviorVerifier`]: action verification with timed postconditions
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use patternsense_core::PatternDetector;
//! use patternsense_protocols::{DocumentEnv, GuaranteeLevel, Pattern};
//!
//! fn scan(env: Arc<dyn DocumentEnv>) {
//!     let mut detector = PatternDetector::new(env);
//!     for result in detector.detect(Pattern::Chat, GuaranteeLevel::Behavioral) {
//!         println!("{} {} {:.2}", result.pattern, result.path, result.confidence);
//!     }
//! }
//! ```

pub mod correlation;
pub mod lsh;
pub mod phrasal;
pub mod scanner;
pub mod snapshot;
pub mod verifier;

pub use correlation::{Clock, CorrelationEngine};
pub use lsh::{LshError, LshIndexEntry, Signature, SimilarEntry, StructuralHasher, similarity};
pub use phrasal::{PhrasalScore, PhrasalScorer, TextSurface};
pub use scanner::PatternDetector;
pub use snapshot::{ChangeType, Diff, QuickMatch, Snapshot, SnapshotDiffer, ValueRecord};
pub use verifier::{
    BehaviorVerifier, Check, CheckOutcome, CheckPhase, StateCapture, VerificationOutcome,
    VerifierTrace, VerifyAction,
};
