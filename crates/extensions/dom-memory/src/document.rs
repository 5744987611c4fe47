//! In-memory document tree.

use std::path::Path;

use parking_lot::RwLock;
use tracing::debug;

use patternsense_protocols::{
    ComputedStyle, DocumentEnv, DomError, DomResult, FormState, MutationBatch, MutationKind,
    MutationRecord, NodeId, Rect, ScrollMetrics, Viewport,
};

use crate::error::MemoryDocError;
use crate::fixture::{DocumentSpec, Fixture, NodeSpec};

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;

/// Box given to elements whose fixture has no explicit rect.
const DEFAULT_RECT: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 100.0,
    height: 20.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    /// Removed from the tree, or forcibly detached by a test.
    Detached,
    /// Reads are refused, as for cross-origin content.
    Denied,
}

#[derive(Debug)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    style: ComputedStyle,
    rect: Rect,
    scroll: ScrollMetrics,
    form: FormState,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    fault: Option<Fault>,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
    viewport: Viewport,
    pending: Vec<MutationRecord>,
}

impl Inner {
    fn get(&self, node: NodeId) -> DomResult<&NodeData> {
        let data = self.nodes.get(node.0 as usize).ok_or(DomError::NotFound(node))?;
        match data.fault {
            None => Ok(data),
            Some(Fault::Detached) => Err(DomError::Detached(node)),
            Some(Fault::Denied) => Err(DomError::AccessDenied(node)),
        }
    }

    fn get_mut(&mut self, node: NodeId) -> Result<&mut NodeData, MemoryDocError> {
        let data = self
            .nodes
            .get_mut(node.0 as usize)
            .ok_or(MemoryDocError::NodeNotFound(node))?;
        if data.fault == Some(Fault::Detached) {
            return Err(MemoryDocError::Detached(node));
        }
        Ok(data)
    }

    /// Insert `spec` and its subtree, returning the id of its top element.
    fn insert(&mut self, spec: &NodeSpec, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        let form = FormState {
            value: spec.value.clone(),
            checked: spec.checked,
            selected: spec.selected,
        };
        self.nodes.push(NodeData {
            tag: spec.tag.to_ascii_lowercase(),
            attrs: spec.attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            text: spec.text.clone(),
            style: spec.style.clone(),
            rect: spec.rect.unwrap_or(DEFAULT_RECT),
            scroll: spec.scroll,
            form,
            parent,
            children: Vec::with_capacity(spec.children.len()),
            fault: None,
        });
        for child in &spec.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0 as usize].children.push(child_id);
        }
        id
    }

    /// `display: none` on the node or any ancestor.
    fn display_none(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            match self.nodes.get(n.0 as usize) {
                Some(data) if data.style.display == "none" => return true,
                Some(data) => current = data.parent,
                None => return false,
            }
        }
        false
    }

    fn text_of(&self, node: NodeId, out: &mut Vec<String>) -> DomResult<()> {
        let data = self.get(node)?;
        let own = data.text.trim();
        if !own.is_empty() {
            out.push(own.to_string());
        }
        for child in &data.children {
            self.text_of(*child, out)?;
        }
        Ok(())
    }

    fn mark_subtree(&mut self, node: NodeId, fault: Fault) {
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if let Some(data) = self.nodes.get_mut(n.0 as usize) {
                data.fault = Some(fault);
                stack.extend(data.children.iter().copied());
            }
        }
    }
}

/// A mutable, thread-safe document tree implementing [`DocumentEnv`].
///
/// Structural and attribute edits are recorded and can be drained as a
/// [`MutationBatch`], which is what a live mutation feed would deliver.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    inner: RwLock<Inner>,
}

impl MemoryDocument {
    /// An empty document with no root.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spec(spec: &DocumentSpec) -> Self {
        let mut inner = Inner {
            viewport: spec.viewport,
            ..Default::default()
        };
        let root = inner.insert(&spec.root, None);
        inner.root = Some(root);
        debug!(nodes = inner.nodes.len(), root_tag = %spec.root.tag, "Loaded document");
        Self {
            inner: RwLock::new(inner),
        }
    }

    pub fn from_node(root: &NodeSpec) -> Self {
        Self::from_spec(&DocumentSpec {
            viewport: Viewport::default(),
            root: root.clone(),
        })
    }

    /// Parse a fixture: either a bare node or `{viewport, root}`.
    pub fn from_json(json: &str) -> Result<Self, MemoryDocError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self::from_spec(&DocumentSpec::from(fixture)))
    }

    pub fn load(path: &Path) -> Result<Self, MemoryDocError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Number of nodes ever inserted, including removed ones.
    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().root.is_none()
    }

    /// First attached node whose `id` attribute equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let inner = self.inner.read();
        inner
            .nodes
            .iter()
            .enumerate()
            .find(|(_, n)| n.fault.is_none() && n.attrs.iter().any(|(k, v)| k == "id" && v == id))
            .map(|(i, _)| NodeId(i as u64))
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.inner.write().viewport = viewport;
    }

    /// Set or remove (`None`) an attribute. Records an attribute mutation
    /// when the value actually changes.
    pub fn set_attribute(
        &self,
        node: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), MemoryDocError> {
        let mut inner = self.inner.write();
        let data = inner.get_mut(node)?;
        let position = data.attrs.iter().position(|(k, _)| k == name);
        let old_value = position.map(|i| data.attrs[i].1.clone());
        if old_value.as_deref() == value {
            return Ok(());
        }
        match (position, value) {
            (Some(i), Some(v)) => data.attrs[i].1 = v.to_string(),
            (Some(i), None) => {
                data.attrs.remove(i);
            }
            (None, Some(v)) => data.attrs.push((name.to_string(), v.to_string())),
            (None, None) => {}
        }
        inner.pending.push(MutationRecord {
            target: node,
            kind: MutationKind::Attribute {
                name: name.to_string(),
                old_value,
            },
        });
        Ok(())
    }

    /// Append `spec` as the last child of `parent`. Records a child-list
    /// mutation on `parent`.
    pub fn append_child(&self, parent: NodeId, spec: &NodeSpec) -> Result<NodeId, MemoryDocError> {
        let mut inner = self.inner.write();
        inner.get_mut(parent)?;
        let id = inner.insert(spec, Some(parent));
        inner.get_mut(parent)?.children.push(id);
        inner.pending.push(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList {
                added: vec![id],
                removed: vec![],
            },
        });
        Ok(id)
    }

    /// Detach `node` from its parent. The subtree's ids stay allocated but
    /// every read on them fails with [`DomError::Detached`].
    pub fn remove_child(&self, node: NodeId) -> Result<(), MemoryDocError> {
        let mut inner = self.inner.write();
        let parent = inner.get_mut(node)?.parent.ok_or(MemoryDocError::RootRemoval)?;
        inner.get_mut(parent)?.children.retain(|c| *c != node);
        inner.mark_subtree(node, Fault::Detached);
        inner.pending.push(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList {
                added: vec![],
                removed: vec![node],
            },
        });
        Ok(())
    }

    /// Replace the computed style. Recorded as a `style` attribute change.
    pub fn set_style(&self, node: NodeId, style: ComputedStyle) -> Result<(), MemoryDocError> {
        let mut inner = self.inner.write();
        let data = inner.get_mut(node)?;
        if data.style == style {
            return Ok(());
        }
        data.style = style;
        inner.pending.push(MutationRecord {
            target: node,
            kind: MutationKind::Attribute {
                name: "style".to_string(),
                old_value: None,
            },
        });
        Ok(())
    }

    /// Convenience over [`set_style`](Self::set_style) for `display`.
    pub fn set_display(&self, node: NodeId, display: &str) -> Result<(), MemoryDocError> {
        let mut style = self.computed_style(node)?;
        style.display = display.to_string();
        self.set_style(node, style)
    }

    /// Replace the element's own text. Not recorded.
    pub fn set_text(&self, node: NodeId, text: &str) -> Result<(), MemoryDocError> {
        self.inner.write().get_mut(node)?.text = text.to_string();
        Ok(())
    }

    /// Set a control's live value, as typing would. Not recorded.
    pub fn set_value(&self, node: NodeId, value: &str) -> Result<(), MemoryDocError> {
        self.inner.write().get_mut(node)?.form.value = Some(value.to_string());
        Ok(())
    }

    pub fn set_checked(&self, node: NodeId, checked: bool) -> Result<(), MemoryDocError> {
        self.inner.write().get_mut(node)?.form.checked = Some(checked);
        Ok(())
    }

    pub fn set_scroll(&self, node: NodeId, scroll: ScrollMetrics) -> Result<(), MemoryDocError> {
        self.inner.write().get_mut(node)?.scroll = scroll;
        Ok(())
    }

    pub fn set_rect(&self, node: NodeId, rect: Rect) -> Result<(), MemoryDocError> {
        self.inner.write().get_mut(node)?.rect = rect;
        Ok(())
    }

    /// Make every read on `node` fail as detached, without touching the tree.
    pub fn detach(&self, node: NodeId) -> Result<(), MemoryDocError> {
        self.inner.write().get_mut(node)?.fault = Some(Fault::Detached);
        Ok(())
    }

    /// Make every read on `node` fail with access denied.
    pub fn deny_access(&self, node: NodeId) -> Result<(), MemoryDocError> {
        self.inner.write().get_mut(node)?.fault = Some(Fault::Denied);
        Ok(())
    }

    pub fn pending_mutations(&self) -> usize {
        self.inner.read().pending.len()
    }

    /// Take every recorded mutation as one batch stamped `timestamp_ms`.
    /// Returns `None` when nothing changed.
    pub fn drain_mutations_at(&self, timestamp_ms: i64) -> Option<MutationBatch> {
        let records = std::mem::take(&mut self.inner.write().pending);
        if records.is_empty() {
            return None;
        }
        Some(MutationBatch {
            timestamp_ms,
            records,
        })
    }

    /// [`drain_mutations_at`](Self::drain_mutations_at) stamped with the wall clock.
    pub fn drain_mutations(&self) -> Option<MutationBatch> {
        self.drain_mutations_at(chrono::Utc::now().timestamp_millis())
    }
}

impl DocumentEnv for MemoryDocument {
    fn root(&self) -> Option<NodeId> {
        self.inner.read().root
    }

    fn tag_name(&self, node: NodeId) -> DomResult<String> {
        Ok(self.inner.read().get(node)?.tag.clone())
    }

    fn parent(&self, node: NodeId) -> DomResult<Option<NodeId>> {
        Ok(self.inner.read().get(node)?.parent)
    }

    fn children(&self, node: NodeId) -> DomResult<Vec<NodeId>> {
        Ok(self.inner.read().get(node)?.children.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> DomResult<Option<String>> {
        Ok(self
            .inner
            .read()
            .get(node)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone()))
    }

    fn attributes(&self, node: NodeId) -> DomResult<Vec<(String, String)>> {
        Ok(self.inner.read().get(node)?.attrs.clone())
    }

    /// Trimmed text pieces of the subtree joined by single spaces.
    fn text_content(&self, node: NodeId) -> DomResult<String> {
        let inner = self.inner.read();
        let mut pieces = Vec::new();
        inner.text_of(node, &mut pieces)?;
        Ok(pieces.join(" "))
    }

    fn computed_style(&self, node: NodeId) -> DomResult<ComputedStyle> {
        Ok(self.inner.read().get(node)?.style.clone())
    }

    fn bounding_rect(&self, node: NodeId) -> DomResult<Rect> {
        let inner = self.inner.read();
        let rect = inner.get(node)?.rect;
        if inner.display_none(node) {
            return Ok(Rect::new(rect.x, rect.y, 0.0, 0.0));
        }
        Ok(rect)
    }

    fn scroll_metrics(&self, node: NodeId) -> DomResult<ScrollMetrics> {
        Ok(self.inner.read().get(node)?.scroll)
    }

    fn form_state(&self, node: NodeId) -> DomResult<FormState> {
        Ok(self.inner.read().get(node)?.form.clone())
    }

    fn viewport(&self) -> Viewport {
        self.inner.read().viewport
    }
}
