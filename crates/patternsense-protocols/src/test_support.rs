//! Minimal tree used by unit tests in this crate.

use std::collections::HashSet;

use crate::dom::{ComputedStyle, DocumentEnv, FormState, NodeId, Rect, ScrollMetrics};
use crate::error::{DomError, DomResult};

struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Default)]
pub struct TreeDoc {
    nodes: Vec<Node>,
    broken: HashSet<NodeId>,
}

impl TreeDoc {
    pub fn new(root_tag: &str) -> Self {
        let mut doc = Self::default();
        doc.nodes.push(Node {
            tag: root_tag.to_string(),
            attrs: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        });
        doc
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)], text: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(Node {
            tag: tag.to_string(),
            attrs: attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            text: text.to_string(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    /// Make every read on `node` fail.
    pub fn break_node(&mut self, node: NodeId) {
        self.broken.insert(node);
    }

    fn get(&self, node: NodeId) -> DomResult<&Node> {
        if self.broken.contains(&node) {
            return Err(DomError::Detached(node));
        }
        self.nodes.get(node.0 as usize).ok_or(DomError::NotFound(node))
    }
}

impl DocumentEnv for TreeDoc {
    fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() { None } else { Some(NodeId(0)) }
    }

    fn tag_name(&self, node: NodeId) -> DomResult<String> {
        Ok(self.get(node)?.tag.clone())
    }

    fn parent(&self, node: NodeId) -> DomResult<Option<NodeId>> {
        Ok(self.get(node)?.parent)
    }

    fn children(&self, node: NodeId) -> DomResult<Vec<NodeId>> {
        Ok(self.get(node)?.children.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> DomResult<Option<String>> {
        Ok(self
            .get(node)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone()))
    }

    fn attributes(&self, node: NodeId) -> DomResult<Vec<(String, String)>> {
        Ok(self.get(node)?.attrs.clone())
    }

    fn text_content(&self, node: NodeId) -> DomResult<String> {
        let n = self.get(node)?;
        let mut out = n.text.clone();
        for child in &n.children {
            out.push_str(&self.text_content(*child)?);
        }
        Ok(out)
    }

    fn computed_style(&self, node: NodeId) -> DomResult<ComputedStyle> {
        self.get(node)?;
        Ok(ComputedStyle::default())
    }

    fn bounding_rect(&self, node: NodeId) -> DomResult<Rect> {
        self.get(node)?;
        Ok(Rect::new(0.0, 0.0, 100.0, 20.0))
    }

    fn scroll_metrics(&self, node: NodeId) -> DomResult<ScrollMetrics> {
        self.get(node)?;
        Ok(ScrollMetrics::default())
    }

    fn form_state(&self, node: NodeId) -> DomResult<FormState> {
        self.get(node)?;
        Ok(FormState::default())
    }
}
