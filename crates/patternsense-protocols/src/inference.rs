//! Action and mutation feeds, and passively inferred patterns.

use serde::{Deserialize, Serialize};

use crate::detection::Components;
use crate::dom::NodeId;
use crate::pattern::Pattern;

/// Raw user interaction reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionKind {
    /// Pointer press.
    Click,
    /// Value changed on a control.
    Input,
    Scroll,
    KeyPress { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    pub target: NodeId,
    /// Milliseconds on the host clock.
    pub timestamp_ms: i64,
}

impl InteractionEvent {
    pub fn new(kind: InteractionKind, target: NodeId, timestamp_ms: i64) -> Self {
        Self {
            kind,
            target,
            timestamp_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationKind {
    ChildList {
        #[serde(default)]
        added: Vec<NodeId>,
        #[serde(default)]
        removed: Vec<NodeId>,
    },
    Attribute {
        name: String,
        #[serde(default)]
        old_value: Option<String>,
    },
}

/// One observed change under `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

/// A batch delivered by the mutation feed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MutationBatch {
    pub timestamp_ms: i64,
    #[serde(default)]
    pub records: Vec<MutationRecord>,
}

/// A pattern inferred from action/mutation correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredPattern {
    pub pattern: Pattern,
    pub confidence: f64,
    pub evidence: String,
    pub container: NodeId,
    pub container_tag: String,
    #[serde(default)]
    pub container_id: String,
    #[serde(default)]
    pub extra_parts: Components,
    pub inferred_at_ms: i64,
}

impl InferredPattern {
    /// Deduplication key: `(pattern, container tag, container id)`.
    pub fn dedup_key(&self) -> (Pattern, String, String) {
        (self.pattern, self.container_tag.clone(), self.container_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_kind_tagged() {
        let kind = InteractionKind::KeyPress {
            key: "Enter".to_string(),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "key_press");
        assert_eq!(json["key"], "Enter");
    }

    #[test]
    fn test_mutation_batch_from_json() {
        let json = r#"{
            "timestamp_ms": 1200,
            "records": [
                {"target": 3, "kind": {"type": "child_list", "added": [9]}},
                {"target": 4, "kind": {"type": "attribute", "name": "aria-expanded"}}
            ]
        }"#;
        let batch: MutationBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(
            batch.records[0].kind,
            MutationKind::ChildList {
                added: vec![NodeId(9)],
                removed: vec![],
            }
        );
    }

    #[test]
    fn test_dedup_key() {
        let inferred = InferredPattern {
            pattern: Pattern::Feed,
            confidence: 0.7,
            evidence: "scroll".to_string(),
            container: NodeId(1),
            container_tag: "ul".to_string(),
            container_id: "posts".to_string(),
            extra_parts: Components::default(),
            inferred_at_ms: 0,
        };
        assert_eq!(
            inferred.dedup_key(),
            (Pattern::Feed, "ul".to_string(), "posts".to_string())
        );
    }
}
