//! Point-in-time value snapshots and categorized diffs.
//!
//! A snapshot keeps one [`ValueRecord`] per "interesting" node, keyed by its
//! structural path (`TAG[i]>TAG[j]...`). Diffing two snapshots classifies
//! every field difference through a fixed table, and [`detect_pattern`]
//! turns a diff into cheap pattern guesses without any selector config.

mod classify;
mod record;

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

use patternsense_config::SnapshotConfig;
use patternsense_protocols::{DocumentEnv, DocumentEnvExt, NodeId};

pub use classify::{classify, detect_pattern};
pub use record::{
    ChangeType, ChangedEntry, Diff, DiffSummary, FieldChange, NumericShift, QuickMatch, Snapshot,
    ValueRecord,
};

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

/// Captures and retains snapshots of a document.
pub struct SnapshotDiffer {
    env: Arc<dyn DocumentEnv>,
    config: SnapshotConfig,
    history: VecDeque<Snapshot>,
}

impl SnapshotDiffer {
    pub fn new(env: Arc<dyn DocumentEnv>) -> Self {
        Self::with_config(env, SnapshotConfig::default())
    }

    pub fn with_config(env: Arc<dyn DocumentEnv>, config: SnapshotConfig) -> Self {
        Self {
            env,
            config,
            history: VecDeque::new(),
        }
    }

    /// Capture without retaining.
    pub fn capture_at(&self, timestamp_ms: i64) -> Snapshot {
        let mut elements = BTreeMap::new();
        let Some(root) = self.env.root() else {
            return Snapshot {
                timestamp_ms,
                elements,
            };
        };

        let Ok(tag) = self.env.tag_name(root) else {
            return Snapshot {
                timestamp_ms,
                elements,
            };
        };
        let mut stack = vec![(root, format!("{}[0]", tag.to_ascii_uppercase()))];
        let mut visited = 0usize;

        while let Some((node, path)) = stack.pop() {
            visited += 1;
            if visited > patternsense_protocols::dom_ext::MAX_WALK_NODES {
                break;
            }
            let children = self.env.children(node).unwrap_or_default();
            if let Some(record) = self.record(node, children.len()) {
                elements.insert(path.clone(), record);
            }
            for (index, child) in children.iter().enumerate().rev() {
                let Ok(child_tag) = self.env.tag_name(*child) else {
                    continue;
                };
                stack.push((
                    *child,
                    format!("{}>{}[{}]", path, child_tag.to_ascii_uppercase(), index),
                ));
            }
        }

        debug!(nodes = elements.len(), "Captured snapshot");
        Snapshot {
            timestamp_ms,
            elements,
        }
    }

    /// Capture stamped with the wall clock, without retaining.
    pub fn capture(&self) -> Snapshot {
        self.capture_at(chrono::Utc::now().timestamp_millis())
    }

    /// Capture and retain, evicting the oldest beyond `max_retained`.
    pub fn snapshot(&mut self) -> &Snapshot {
        let snap = self.capture();
        self.retain(snap)
    }

    pub fn snapshot_at(&mut self, timestamp_ms: i64) -> &Snapshot {
        let snap = self.capture_at(timestamp_ms);
        self.retain(snap)
    }

    fn retain(&mut self, snap: Snapshot) -> &Snapshot {
        self.history.push_back(snap);
        while self.history.len() > self.config.max_retained.max(1) {
            self.history.pop_front();
        }
        &self.history[self.history.len() - 1]
    }

    pub fn diff(&self, before: &Snapshot, after: &Snapshot) -> Diff {
        classify::diff(before, after)
    }

    /// Diff of the two newest retained snapshots.
    pub fn diff_latest(&self) -> Option<Diff> {
        let n = self.history.len();
        if n < 2 {
            return None;
        }
        Some(classify::diff(&self.history[n - 2], &self.history[n - 1]))
    }

    pub fn detect_pattern(&self, diff: &Diff) -> Vec<QuickMatch> {
        detect_pattern(diff)
    }

    /// Retained snapshots, oldest first.
    pub fn history(&self) -> &VecDeque<Snapshot> {
        &self.history
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.history.back()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Build a record; `None` when the node yields no content field or its
    /// style cannot be read.
    fn record(&self, node: NodeId, child_count: usize) -> Option<ValueRecord> {
        let env = self.env.as_ref();
        let style = env.computed_style(node).ok()?;

        let mut record = ValueRecord {
            display: style.display.clone(),
            visibility: style.visibility.clone(),
            opacity: style.opacity,
            ..Default::default()
        };

        if matches!(style.position.as_str(), "fixed" | "absolute" | "sticky") {
            record.position = Some(style.position.clone());
        }

        if child_count == 0 {
            if let Ok(text) = env.text_content(node) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    record.text_length = Some(trimmed.chars().count());
                    record.text = Some(trimmed.chars().take(self.config.max_text_len).collect());
                }
            }
        } else {
            record.child_count = Some(child_count);
        }

        if env.is_form_control(node) {
            if let Ok(state) = env.form_state(node) {
                let value = state.value.or_else(|| env.attr(node, "value")).unwrap_or_default();
                record.value_length = Some(value.chars().count());
                record.value = Some(value);
                record.checked = state.checked;
                record.selected = state.selected;
            }
        }

        if style.allows_scroll() {
            if let Ok(metrics) = env.scroll_metrics(node) {
                if metrics.overflows() {
                    record.scroll_top = Some(metrics.scroll_top);
                    record.scroll_height = Some(metrics.scroll_height);
                    record.is_scrollable = Some(true);
                }
            }
        }

        if let Ok(rect) = env.bounding_rect(node) {
            if rect.width > 0.0 {
                record.width = Some(rect.width);
            }
            if rect.height > 0.0 {
                record.height = Some(rect.height);
            }
        }

        for (name, value) in env.attributes(node).unwrap_or_default() {
            if name.starts_with("aria-") {
                record.aria_state.insert(name, value);
            } else if name.starts_with("data-") {
                record.data_attrs.insert(name, value);
            }
        }

        record.has_content().then_some(record)
    }
}
