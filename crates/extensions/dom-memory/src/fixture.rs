//! JSON fixture format.
//!
//! A fixture is either a bare node or a document wrapper with a viewport:
//!
//! ```json
//! {
//!   "viewport": {"width": 1024, "height": 768},
//!   "root": {
//!     "tag": "div",
//!     "attrs": {"class": "chat"},
//!     "children": [
//!       {"tag": "ul", "style": {"overflow_y": "auto"},
//!        "scroll": {"scroll_top": 0, "scroll_height": 900, "client_height": 300}},
//!       {"tag": "input", "attrs": {"placeholder": "Type a message"}}
//!     ]
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use patternsense_protocols::{ComputedStyle, Rect, ScrollMetrics, Viewport};
use serde::{Deserialize, Serialize};

/// One element and its subtree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeSpec {
    pub tag: String,

    /// Attributes; iteration order is by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,

    /// Text owned directly by this element.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    #[serde(default)]
    pub style: ComputedStyle,

    /// Explicit box; elements without one get a 100x20 box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,

    #[serde(default)]
    pub scroll: ScrollMetrics,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn scroll(mut self, scroll: ScrollMetrics) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Number of elements in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NodeSpec::count).sum::<usize>()
    }
}

/// A document fixture with its viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSpec {
    #[serde(default)]
    pub viewport: Viewport,
    pub root: NodeSpec,
}

/// Accepted fixture shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Fixture {
    Document(DocumentSpec),
    Node(NodeSpec),
}

impl From<Fixture> for DocumentSpec {
    fn from(fixture: Fixture) -> Self {
        match fixture {
            Fixture::Document(doc) => doc,
            Fixture::Node(root) => DocumentSpec {
                viewport: Viewport::default(),
                root,
            },
        }
    }
}
