//! Detection records returned to callers.

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::pattern::{GuaranteeLevel, Pattern};

/// Which lexicon list a phrase came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseKind {
    Strong,
    Medium,
    Placeholder,
    Button,
    Negative,
}

impl PhraseKind {
    /// Score contribution of one match.
    pub fn weight(&self) -> f64 {
        match self {
            PhraseKind::Strong => 0.35,
            PhraseKind::Medium => 0.15,
            PhraseKind::Placeholder => 0.25,
            PhraseKind::Button => 0.2,
            PhraseKind::Negative => -0.25,
        }
    }
}

/// A lexicon phrase found in a candidate's text surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseMatch {
    pub kind: PhraseKind,
    pub phrase: String,
}

/// The four signals behind a confidence value, each in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Evidence {
    pub structural: f64,
    pub phrasal: f64,
    #[serde(default)]
    pub phrasal_matches: Vec<PhraseMatch>,
    pub semantic: f64,
    pub behavioral: f64,
}

/// Sub-parts of a bound pattern instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<NodeId>,
    /// Message list, menu panel, dialog body or item list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_button: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_button: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_button: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_input: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_input: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_button: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_button: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<NodeId>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        *self == Components::default()
    }
}

/// Structural identity of a detection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignatureSummary {
    pub fingerprint: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// One classified region of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub path: String,
    pub node: NodeId,
    pub pattern: Pattern,
    pub confidence: f64,
    pub guarantee: GuaranteeLevel,
    pub evidence: Evidence,
    #[serde(default)]
    pub components: Components,
    #[serde(default)]
    pub signature: SignatureSummary,
}
