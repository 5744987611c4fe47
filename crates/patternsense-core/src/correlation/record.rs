//! Queue entries, with the document context captured when they arrive.

use patternsense_protocols::{
    DocumentEnv, DocumentEnvExt, InteractionEvent, InteractionKind, MutationKind, MutationRecord,
    NodeId,
};

/// Attribute changes that can reveal a node.
const REVEALING_ATTRIBUTES: &[&str] = &["style", "class", "hidden", "open", "aria-hidden"];

/// A node as it looked when first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeInfo {
    pub node: NodeId,
    pub tag: String,
    pub id: String,
}

impl NodeInfo {
    pub fn capture(env: &dyn DocumentEnv, node: NodeId) -> Self {
        Self {
            node,
            tag: env.tag(node),
            id: env.attr(node, "id").unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ActionEntry {
    pub event: InteractionEvent,
    pub target: NodeInfo,
    /// Clicked node or nearest ancestor carrying `aria-expanded`.
    pub expandable: Option<NodeInfo>,
    pub text_input: bool,
    /// Scroll target was within the bottom threshold.
    pub at_bottom: bool,
    pub correlated: bool,
}

impl ActionEntry {
    /// `None` for interactions that never take part in correlation.
    pub fn capture(env: &dyn DocumentEnv, event: InteractionEvent, bottom_px: f64) -> Option<Self> {
        match &event.kind {
            InteractionKind::Click | InteractionKind::Input | InteractionKind::Scroll => {}
            InteractionKind::KeyPress { key } if key == "Enter" => {}
            InteractionKind::KeyPress { .. } => return None,
        }

        let target = event.target;
        let expandable = match event.kind {
            InteractionKind::Click => {
                let mut current = Some(target);
                let mut found = None;
                while let Some(n) = current {
                    if env.has_attr(n, "aria-expanded") {
                        found = Some(NodeInfo::capture(env, n));
                        break;
                    }
                    current = env.parent_node(n);
                }
                found
            }
            _ => None,
        };
        let at_bottom = matches!(event.kind, InteractionKind::Scroll)
            && env
                .scroll_metrics(target)
                .map(|m| m.at_bottom(bottom_px))
                .unwrap_or(false);

        Some(Self {
            target: NodeInfo::capture(env, target),
            expandable,
            text_input: env.is_text_input(target),
            at_bottom,
            correlated: false,
            event,
        })
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.event.timestamp_ms
    }

    pub fn is_enter(&self) -> bool {
        matches!(&self.event.kind, InteractionKind::KeyPress { key } if key == "Enter")
    }
}

/// A node that became visible.
#[derive(Debug, Clone)]
pub(crate) struct Appearance {
    pub info: NodeInfo,
    pub dialog: bool,
    pub large_overlay: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct MutationEntry {
    pub record: MutationRecord,
    pub timestamp_ms: i64,
    pub target: NodeInfo,
    pub appearances: Vec<Appearance>,
}

impl MutationEntry {
    pub fn capture(
        env: &dyn DocumentEnv,
        record: MutationRecord,
        timestamp_ms: i64,
        overlay_ratio: f64,
    ) -> Self {
        let appearing: Vec<NodeId> = match &record.kind {
            MutationKind::ChildList { added, .. } => added.clone(),
            MutationKind::Attribute { name, .. } if REVEALING_ATTRIBUTES.contains(&name.as_str()) => {
                vec![record.target]
            }
            MutationKind::Attribute { .. } => Vec::new(),
        };
        let appearances = appearing
            .into_iter()
            .filter(|n| env.is_visible(*n))
            .map(|n| appearance(env, n, overlay_ratio))
            .collect();

        Self {
            target: NodeInfo::capture(env, record.target),
            record,
            timestamp_ms,
            appearances,
        }
    }

    pub fn added_children(&self) -> bool {
        matches!(&self.record.kind, MutationKind::ChildList { added, .. } if !added.is_empty())
    }

    pub fn is_attribute(&self, attr: &str) -> bool {
        matches!(&self.record.kind, MutationKind::Attribute { name, .. } if name == attr)
    }
}

fn is_dialog(env: &dyn DocumentEnv, node: NodeId) -> bool {
    matches!(
        env.attr(node, "role").as_deref(),
        Some("dialog") | Some("alertdialog")
    ) || env.tag(node) == "dialog"
        || env.attr(node, "aria-modal").as_deref() == Some("true")
}

/// The appeared node, or the dialog inside it when there is one.
fn appearance(env: &dyn DocumentEnv, node: NodeId, overlay_ratio: f64) -> Appearance {
    if let Some(dialog) = env.walk(node).into_iter().find(|n| is_dialog(env, *n)) {
        return Appearance {
            info: NodeInfo::capture(env, dialog),
            dialog: true,
            large_overlay: false,
        };
    }
    let large_overlay = env.is_fixed_or_absolute(node)
        && env
            .bounding_rect(node)
            .map(|r| r.area() >= overlay_ratio * env.viewport().area())
            .unwrap_or(false);
    Appearance {
        info: NodeInfo::capture(env, node),
        dialog: false,
        large_overlay,
    }
}
