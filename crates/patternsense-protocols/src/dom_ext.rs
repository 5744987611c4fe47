//! Fault-absorbing helpers layered over [`DocumentEnv`].
//!
//! Every helper here converts a failed read into "absent", "false" or
//! "empty", which is the policy all engines follow.

use crate::dom::{DocumentEnv, NodeId};
use crate::selector::Selector;

#[cfg(test)]
#[path = "dom_ext_tests.rs"]
mod tests;

/// Hard cap on nodes visited by a single walk.
pub const MAX_WALK_NODES: usize = 50_000;

const INPUT_TYPES_NOT_TEXT: &[&str] = &[
    "button", "submit", "reset", "checkbox", "radio", "file", "image", "hidden", "range", "color",
];

pub trait DocumentEnvExt: DocumentEnv {
    /// Tag name or the empty string.
    fn tag(&self, node: NodeId) -> String {
        self.tag_name(node).unwrap_or_default()
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.attribute(node, name).ok().flatten()
    }

    fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node).unwrap_or_default()
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).ok().flatten()
    }

    fn text(&self, node: NodeId) -> String {
        self.text_content(node).unwrap_or_default()
    }

    fn class_list(&self, node: NodeId) -> Vec<String> {
        self.attr(node, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Pre-order walk of `node` and its descendants.
    fn walk(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            if out.len() >= MAX_WALK_NODES {
                break;
            }
            let mut kids = self.child_nodes(current);
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Descendants of `node` in document order, excluding `node` itself.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut all = self.walk(node);
        all.remove(0);
        all
    }

    /// Every node reachable from the root, in document order.
    fn all_nodes(&self) -> Vec<NodeId> {
        self.root().map(|r| self.walk(r)).unwrap_or_default()
    }

    /// Document-wide query in document order.
    fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.all_nodes()
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// Query restricted to the descendants of `scope`.
    fn query_within(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// Inclusive containment: a node contains itself.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent_node(n);
        }
        false
    }

    /// Rendered with a non-empty box and not hidden by style.
    fn is_visible(&self, node: NodeId) -> bool {
        let Ok(style) = self.computed_style(node) else {
            return false;
        };
        if style.is_hidden() {
            return false;
        }
        match self.bounding_rect(node) {
            Ok(rect) => !rect.is_empty(),
            Err(_) => false,
        }
    }

    fn is_scrollable(&self, node: NodeId) -> bool {
        let allows = self
            .computed_style(node)
            .map(|s| s.allows_scroll())
            .unwrap_or(false);
        allows
            && self
                .scroll_metrics(node)
                .map(|m| m.overflows())
                .unwrap_or(false)
    }

    fn is_fixed_or_absolute(&self, node: NodeId) -> bool {
        self.computed_style(node)
            .map(|s| s.is_out_of_flow())
            .unwrap_or(false)
    }

    /// Text-entry control: textarea, contenteditable, role=textbox or a
    /// text-like `<input>`.
    fn is_text_input(&self, node: NodeId) -> bool {
        match self.tag(node).as_str() {
            "textarea" => true,
            "input" => {
                let ty = self.attr(node, "type").unwrap_or_default().to_ascii_lowercase();
                !INPUT_TYPES_NOT_TEXT.contains(&ty.as_str())
            }
            _ => {
                matches!(self.attr(node, "contenteditable").as_deref(), Some("" | "true"))
                    || self.attr(node, "role").as_deref() == Some("textbox")
            }
        }
    }

    /// Any form control a user can fill or toggle.
    fn is_form_control(&self, node: NodeId) -> bool {
        matches!(self.tag(node).as_str(), "input" | "textarea" | "select") || self.is_text_input(node)
    }

    fn is_button(&self, node: NodeId) -> bool {
        match self.tag(node).as_str() {
            "button" => true,
            "input" => matches!(
                self.attr(node, "type").unwrap_or_default().to_ascii_lowercase().as_str(),
                "button" | "submit" | "reset" | "image"
            ),
            _ => self.attr(node, "role").as_deref() == Some("button"),
        }
    }

    /// Visible label of a button-like node.
    fn button_text(&self, node: NodeId) -> String {
        let text = if self.tag(node) == "input" {
            self.form_state(node)
                .ok()
                .and_then(|f| f.value)
                .or_else(|| self.attr(node, "value"))
                .unwrap_or_default()
        } else {
            self.text(node)
        };
        let text = text.trim().to_string();
        if text.is_empty() {
            self.attr(node, "aria-label")
                .or_else(|| self.attr(node, "title"))
                .unwrap_or_default()
        } else {
            text
        }
    }

    /// Current value of a form control, falling back to the `value` attribute.
    fn current_value(&self, node: NodeId) -> Option<String> {
        self.form_state(node)
            .ok()
            .and_then(|f| f.value)
            .or_else(|| self.attr(node, "value"))
    }

    /// Structural path `TAG[i]>TAG[j]...`, index among the parent's element
    /// children, root index 0.
    fn structural_path(&self, node: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = node;
        loop {
            let tag = self.tag_name(current).ok()?.to_ascii_uppercase();
            match self.parent(current).ok()? {
                Some(parent) => {
                    let index = self
                        .children(parent)
                        .ok()?
                        .iter()
                        .position(|c| *c == current)?;
                    segments.push(format!("{}[{}]", tag, index));
                    current = parent;
                }
                None => {
                    segments.push(format!("{}[0]", tag));
                    break;
                }
            }
        }
        segments.reverse();
        Some(segments.join(">"))
    }

    /// Inverse of [`structural_path`](Self::structural_path) against the
    /// current tree. Fails if any tag along the way no longer matches.
    fn resolve_path(&self, path: &str) -> Option<NodeId> {
        let mut segments = path.split('>');
        let root = self.root()?;
        let (root_tag, _) = parse_segment(segments.next()?)?;
        if !self.tag(root).eq_ignore_ascii_case(&root_tag) {
            return None;
        }
        let mut current = root;
        for segment in segments {
            let (tag, index) = parse_segment(segment)?;
            let child = *self.child_nodes(current).get(index)?;
            if !self.tag(child).eq_ignore_ascii_case(&tag) {
                return None;
            }
            current = child;
        }
        Some(current)
    }
}

impl<T: DocumentEnv + ?Sized> DocumentEnvExt for T {}

fn parse_segment(segment: &str) -> Option<(String, usize)> {
    let open = segment.find('[')?;
    let close = segment.rfind(']')?;
    let index = segment.get(open + 1..close)?.parse().ok()?;
    Some((segment[..open].to_string(), index))
}
