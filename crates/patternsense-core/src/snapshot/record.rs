//! Snapshot records and diff output types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use patternsense_protocols::Pattern;

/// Normalized values of one node at capture time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Length of the full trimmed text, before truncation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_scrollable: Option<bool>,
    pub display: String,
    pub visibility: String,
    pub opacity: f64,
    /// Only `fixed`, `absolute` or `sticky`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aria_state: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_attrs: BTreeMap<String, String>,
}

impl ValueRecord {
    /// Whether any content field was captured. Style fields alone do not count.
    pub fn has_content(&self) -> bool {
        self.text.is_some()
            || self.value.is_some()
            || self.checked.is_some()
            || self.selected.is_some()
            || self.child_count.is_some()
            || self.scroll_top.is_some()
            || self.width.is_some()
            || self.height.is_some()
            || !self.aria_state.is_empty()
            || !self.data_attrs.is_empty()
    }

    pub fn is_hidden(&self) -> bool {
        self.display == "none" || self.visibility == "hidden" || self.opacity <= 0.0
    }

    pub fn is_out_of_flow(&self) -> bool {
        matches!(self.position.as_deref(), Some("fixed" | "absolute"))
    }

    /// Flatten into ordered `(key, value)` pairs; absent fields are omitted.
    pub(crate) fn fields(&self) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        let mut push = |key: &str, value: Option<Value>| {
            if let Some(v) = value {
                out.push((key.to_string(), v));
            }
        };
        push("text", self.text.clone().map(Value::from));
        push("text_length", self.text_length.map(Value::from));
        push("value", self.value.clone().map(Value::from));
        push("value_length", self.value_length.map(Value::from));
        push("checked", self.checked.map(Value::from));
        push("selected", self.selected.map(Value::from));
        push("child_count", self.child_count.map(Value::from));
        push("scroll_top", self.scroll_top.map(Value::from));
        push("scroll_height", self.scroll_height.map(Value::from));
        push("is_scrollable", self.is_scrollable.map(Value::from));
        push("display", Some(Value::from(self.display.clone())));
        push("visibility", Some(Value::from(self.visibility.clone())));
        push("opacity", Some(Value::from(self.opacity)));
        push("position", self.position.clone().map(Value::from));
        push("width", self.width.map(Value::from));
        push("height", self.height.map(Value::from));
        for (k, v) in &self.aria_state {
            out.push((k.clone(), Value::from(v.clone())));
        }
        for (k, v) in &self.data_attrs {
            out.push((k.clone(), Value::from(v.clone())));
        }
        out
    }
}

/// Point-in-time capture keyed by structural path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp_ms: i64,
    pub elements: BTreeMap<String, ValueRecord>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Category of a single field change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeType {
    TextChanged,
    TextGrew,
    TextShrank,
    ValueChanged,
    InputCleared,
    InputFilled,
    Toggled,
    SelectionChanged,
    ChildrenAdded,
    ChildrenRemoved,
    Scrolled,
    ContentGrew,
    ContentShrank,
    ScrollabilityChanged,
    BecameVisible,
    BecameHidden,
    DisplayChanged,
    OpacityChanged,
    PositionChanged,
    Resized,
    Expanded,
    Collapsed,
    AriaChanged,
    DataChanged,
    Changed,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::TextChanged => "text-changed",
            ChangeType::TextGrew => "text-grew",
            ChangeType::TextShrank => "text-shrank",
            ChangeType::ValueChanged => "value-changed",
            ChangeType::InputCleared => "input-cleared",
            ChangeType::InputFilled => "input-filled",
            ChangeType::Toggled => "toggled",
            ChangeType::SelectionChanged => "selection-changed",
            ChangeType::ChildrenAdded => "children-added",
            ChangeType::ChildrenRemoved => "children-removed",
            ChangeType::Scrolled => "scrolled",
            ChangeType::ContentGrew => "content-grew",
            ChangeType::ContentShrank => "content-shrank",
            ChangeType::ScrollabilityChanged => "scrollability-changed",
            ChangeType::BecameVisible => "became-visible",
            ChangeType::BecameHidden => "became-hidden",
            ChangeType::DisplayChanged => "display-changed",
            ChangeType::OpacityChanged => "opacity-changed",
            ChangeType::PositionChanged => "position-changed",
            ChangeType::Resized => "resized",
            ChangeType::Expanded => "expanded",
            ChangeType::Collapsed => "collapsed",
            ChangeType::AriaChanged => "aria-changed",
            ChangeType::DataChanged => "data-changed",
            ChangeType::Changed => "changed",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified field difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub key: String,
    /// `null` when the field was absent.
    pub before: Value,
    pub after: Value,
    pub change_type: ChangeType,
}

/// A path present in both snapshots whose record differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedEntry {
    pub path: String,
    pub changes: Vec<FieldChange>,
    /// The node is fixed or absolute in the later snapshot.
    pub out_of_flow: bool,
}

impl ChangedEntry {
    pub fn has(&self, change_type: ChangeType) -> bool {
        self.changes.iter().any(|c| c.change_type == change_type)
    }
}

/// A numeric field that moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericShift {
    pub path: String,
    pub key: String,
    pub before: f64,
    pub after: f64,
}

impl NumericShift {
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffSummary {
    pub changed: usize,
    pub added: usize,
    pub removed: usize,
    pub increased: usize,
    pub decreased: usize,
    /// Field changes per category.
    pub by_type: BTreeMap<ChangeType, usize>,
}

/// Difference between two snapshots.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diff {
    pub changed: Vec<ChangedEntry>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub increased: Vec<NumericShift>,
    pub decreased: Vec<NumericShift>,
    pub summary: DiffSummary,
}

impl Diff {
    /// No structural or field change at all.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }

    pub fn entry(&self, path: &str) -> Option<&ChangedEntry> {
        self.changed.iter().find(|e| e.path == path)
    }

    /// Changed entries carrying at least one change of `change_type`.
    pub fn entries_with(&self, change_type: ChangeType) -> impl Iterator<Item = &ChangedEntry> {
        self.changed.iter().filter(move |e| e.has(change_type))
    }
}

/// Result of the zero-configuration diff heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickMatch {
    pub pattern: Pattern,
    pub confidence: f64,
    pub evidence: String,
    /// Paths that triggered the rule.
    pub paths: Vec<String>,
}
