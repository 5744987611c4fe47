//! Document environment: the injected collaborator every engine reads from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomResult;

/// Opaque handle to a node owned by a [`DocumentEnv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Viewport dimensions used for "large overlay" heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Bounding rectangle of a node in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Whether the box has any paintable surface.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if this box intersects with another.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// Effective presentation properties of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    #[serde(default = "default_display")]
    pub display: String,
    #[serde(default = "default_visibility")]
    pub visibility: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_position")]
    pub position: String,
    #[serde(default = "default_overflow")]
    pub overflow_x: String,
    #[serde(default = "default_overflow")]
    pub overflow_y: String,
    #[serde(default)]
    pub z_index: Option<i32>,
}

fn default_display() -> String {
    "block".to_string()
}

fn default_visibility() -> String {
    "visible".to_string()
}

fn default_opacity() -> f64 {
    1.0
}

fn default_position() -> String {
    "static".to_string()
}

fn default_overflow() -> String {
    "visible".to_string()
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: default_display(),
            visibility: default_visibility(),
            opacity: default_opacity(),
            position: default_position(),
            overflow_x: default_overflow(),
            overflow_y: default_overflow(),
            z_index: None,
        }
    }
}

impl ComputedStyle {
    pub fn is_hidden(&self) -> bool {
        self.display == "none" || self.visibility == "hidden" || self.opacity <= 0.0
    }

    /// `fixed` or `absolute` positioning.
    pub fn is_out_of_flow(&self) -> bool {
        matches!(self.position.as_str(), "fixed" | "absolute")
    }

    pub fn allows_scroll(&self) -> bool {
        matches!(self.overflow_y.as_str(), "auto" | "scroll")
            || matches!(self.overflow_x.as_str(), "auto" | "scroll")
    }
}

/// Scroll geometry of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Content overflows the visible box.
    pub fn overflows(&self) -> bool {
        self.scroll_height > self.client_height
    }

    /// Within `threshold` pixels of the bottom edge.
    pub fn at_bottom(&self, threshold: f64) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - threshold
    }
}

/// Live form-control state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormState {
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub selected: Option<bool>,
}

/// Read access to a live document tree.
///
/// Implementations wrap whatever hosts the document (a CDP session, a test
/// fixture, ...). Every read may fail for a detached or restricted node;
/// callers treat failures as absent data.
pub trait DocumentEnv: Send + Sync {
    /// Document root element, if the document is loaded.
    fn root(&self) -> Option<NodeId>;

    /// Lower-case tag name.
    fn tag_name(&self, node: NodeId) -> DomResult<String>;

    fn parent(&self, node: NodeId) -> DomResult<Option<NodeId>>;

    /// Element children in document order.
    fn children(&self, node: NodeId) -> DomResult<Vec<NodeId>>;

    fn attribute(&self, node: NodeId, name: &str) -> DomResult<Option<String>>;

    /// All attributes in source order.
    fn attributes(&self, node: NodeId) -> DomResult<Vec<(String, String)>>;

    /// Concatenated text of the node and its descendants.
    fn text_content(&self, node: NodeId) -> DomResult<String>;

    fn computed_style(&self, node: NodeId) -> DomResult<ComputedStyle>;

    fn bounding_rect(&self, node: NodeId) -> DomResult<Rect>;

    fn scroll_metrics(&self, node: NodeId) -> DomResult<ScrollMetrics>;

    fn form_state(&self, node: NodeId) -> DomResult<FormState>;

    fn viewport(&self) -> Viewport {
        Viewport::default()
    }
}
