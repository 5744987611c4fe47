//! Structural rule predicates over a candidate subtree.

use std::collections::HashMap;

use patternsense_protocols::{DocumentEnv, DocumentEnvExt, NodeId, StructuralRule};

/// Minimum z-index counted as "high".
const HIGH_Z_INDEX: i32 = 100;

const CLOSE_LABELS: &[&str] = &["close", "\u{00d7}", "x", "\u{2715}", "dismiss", "cancel"];

/// A candidate and its pre-order walk, shared by every predicate.
pub(crate) struct Subtree<'a> {
    pub env: &'a dyn DocumentEnv,
    pub root: NodeId,
    pub nodes: Vec<NodeId>,
}

impl<'a> Subtree<'a> {
    pub fn new(env: &'a dyn DocumentEnv, root: NodeId) -> Self {
        Self {
            env,
            root,
            nodes: env.walk(root),
        }
    }

    pub fn find(&self, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        self.nodes.iter().copied().find(|n| pred(*n))
    }

    pub fn any(&self, pred: impl Fn(NodeId) -> bool) -> bool {
        self.nodes.iter().any(|n| pred(*n))
    }

    pub fn count(&self, pred: impl Fn(NodeId) -> bool) -> usize {
        self.nodes.iter().filter(|n| pred(**n)).count()
    }

    fn role_in(&self, node: NodeId, roles: &[&str]) -> bool {
        self.env
            .attr(node, "role")
            .map(|r| roles.contains(&r.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    fn input_type(&self, node: NodeId) -> String {
        self.env
            .attr(node, "type")
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    pub fn is_password(&self, node: NodeId) -> bool {
        self.env.tag(node) == "input" && self.input_type(node) == "password"
    }

    /// Control a user can type into or pick from.
    pub fn is_fillable(&self, node: NodeId) -> bool {
        self.env.is_form_control(node)
            && !self.env.is_button(node)
            && self.input_type(node) != "hidden"
    }

    pub fn is_search_input(&self, node: NodeId) -> bool {
        if self.env.tag(node) == "input" && self.input_type(node) == "search" {
            return true;
        }
        if self.role_in(node, &["searchbox"]) {
            return true;
        }
        self.env.is_text_input(node) && self.ancestor_within(node, |a| self.role_in(a, &["search"]))
    }

    /// Explicit submit, or an untyped `<button>` inside a form.
    pub fn is_submit(&self, node: NodeId) -> bool {
        if !self.env.is_button(node) {
            return false;
        }
        let ty = self.input_type(node);
        if ty == "submit" {
            return true;
        }
        self.env.tag(node) == "button"
            && !self.env.has_attr(node, "type")
            && self.has_ancestor(node, |a| self.env.tag(a) == "form")
    }

    pub fn is_close_button(&self, node: NodeId) -> bool {
        if !self.env.is_button(node) && self.env.tag(node) != "a" {
            return false;
        }
        let text = self.env.button_text(node).to_lowercase();
        if CLOSE_LABELS.contains(&text.trim()) {
            return true;
        }
        let aria = self.env.attr(node, "aria-label").unwrap_or_default().to_lowercase();
        if aria.contains("close") || aria.contains("dismiss") {
            return true;
        }
        self.env
            .class_list(node)
            .iter()
            .any(|c| c.to_lowercase().contains("close"))
    }

    pub fn is_dialog(&self, node: NodeId) -> bool {
        self.role_in(node, &["dialog", "alertdialog"])
            || self.env.tag(node) == "dialog"
            || self.env.attr(node, "aria-modal").as_deref() == Some("true")
    }

    pub fn is_popup_list(&self, node: NodeId) -> bool {
        self.role_in(node, &["listbox", "menu", "tree", "grid"])
            || matches!(self.env.tag(node).as_str(), "select" | "datalist")
    }

    pub fn is_article(&self, node: NodeId) -> bool {
        self.env.tag(node) == "article" || self.role_in(node, &["article"])
    }

    /// Strict ancestor test, stopping at the subtree root (inclusive).
    fn ancestor_within(&self, node: NodeId, pred: impl Fn(NodeId) -> bool) -> bool {
        let mut current = self.env.parent_node(node);
        while let Some(n) = current {
            if pred(n) {
                return true;
            }
            if n == self.root {
                return false;
            }
            current = self.env.parent_node(n);
        }
        false
    }

    /// Strict ancestor test up to the document root.
    fn has_ancestor(&self, node: NodeId, pred: impl Fn(NodeId) -> bool) -> bool {
        let mut current = self.env.parent_node(node);
        while let Some(n) = current {
            if pred(n) {
                return true;
            }
            current = self.env.parent_node(n);
        }
        false
    }

    pub fn holds(&self, rule: StructuralRule) -> bool {
        let env = self.env;
        match rule {
            StructuralRule::HasTextInput => self.any(|n| env.is_text_input(n)),
            StructuralRule::HasMultipleInputs => {
                self.count(|n| self.is_fillable(n) && env.is_visible(n)) >= 2
            }
            StructuralRule::HasPasswordInput => self.any(|n| self.is_password(n)),
            StructuralRule::HasSearchInput => self.any(|n| self.is_search_input(n)),
            StructuralRule::HasButton => self.any(|n| env.is_button(n)),
            StructuralRule::HasSubmitButton => self.any(|n| self.is_submit(n)),
            StructuralRule::HasScrollableArea => self.any(|n| env.is_scrollable(n)),
            StructuralRule::HasRepeatedChildren => self.any(|n| has_repeated_children(env, n)),
            StructuralRule::HasFormElement => self.any(|n| env.tag(n) == "form"),
            StructuralRule::HasLabels => self.any(|n| {
                env.tag(n) == "label"
                    || (env.is_form_control(n)
                        && (env.has_attr(n, "aria-label") || env.has_attr(n, "aria-labelledby")))
            }),
            StructuralRule::HasAriaExpanded => self.any(|n| env.has_attr(n, "aria-expanded")),
            StructuralRule::HasPopupList => {
                self.any(|n| self.is_popup_list(n))
                    || (self.any(|n| env.has_attr(n, "aria-haspopup"))
                        && self.any(|n| matches!(env.tag(n).as_str(), "ul" | "ol")))
            }
            StructuralRule::IsFixedOrAbsolute => env.is_fixed_or_absolute(self.root),
            StructuralRule::HasHighZIndex => env
                .computed_style(self.root)
                .ok()
                .and_then(|s| s.z_index)
                .map(|z| z >= HIGH_Z_INDEX)
                .unwrap_or(false),
            StructuralRule::HasDialogRole => self.any(|n| self.is_dialog(n)),
            StructuralRule::HasCloseButton => self.any(|n| self.is_close_button(n)),
            StructuralRule::HasArticleItems => self.count(|n| self.is_article(n)) >= 2,
            StructuralRule::HasLinks => self.any(|n| env.tag(n) == "a" && env.has_attr(n, "href")),
            StructuralRule::IsEdgeAnchored => {
                let Ok(rect) = env.bounding_rect(self.root) else {
                    return false;
                };
                let viewport = env.viewport();
                !rect.is_empty()
                    && (rect.y <= 1.0 || rect.y + rect.height >= viewport.height - 1.0)
            }
            StructuralRule::IsVisible => env.is_visible(self.root),
        }
    }
}

/// `tag.prefix` where prefix is the first class cut at its first `-`, `_`
/// or digit. Bare tag when the node has no usable class.
pub(crate) fn repeat_key(env: &dyn DocumentEnv, node: NodeId) -> String {
    let tag = env.tag(node);
    let prefix = env
        .class_list(node)
        .first()
        .map(|c| {
            c.split(|ch: char| ch == '-' || ch == '_' || ch.is_ascii_digit())
                .next()
                .unwrap_or("")
                .to_string()
        })
        .unwrap_or_default();
    if prefix.is_empty() {
        tag
    } else {
        format!("{}.{}", tag, prefix)
    }
}

/// Children grouped by repeat key, keeping only keys seen at least twice.
fn repeated_groups(env: &dyn DocumentEnv, node: NodeId) -> Vec<(String, Vec<NodeId>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<NodeId>> = HashMap::new();
    for child in env.child_nodes(node) {
        let key = repeat_key(env, child);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(child);
    }
    order
        .into_iter()
        .filter_map(|key| {
            let members = groups.remove(&key)?;
            (members.len() >= 2).then_some((key, members))
        })
        .collect()
}

pub(crate) fn has_repeated_children(env: &dyn DocumentEnv, node: NodeId) -> bool {
    !repeated_groups(env, node).is_empty()
}

/// Members of the largest repeated group; first seen wins ties.
pub(crate) fn repeated_items(env: &dyn DocumentEnv, node: NodeId) -> Vec<NodeId> {
    let mut best: Vec<NodeId> = Vec::new();
    for (_, members) in repeated_groups(env, node) {
        if members.len() > best.len() {
            best = members;
        }
    }
    best
}
