//! Fixed change classification table and the quick diff heuristics.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use patternsense_protocols::Pattern;

use super::record::{
    ChangeType, ChangedEntry, Diff, FieldChange, NumericShift, QuickMatch, Snapshot,
};

/// Fields whose values are compared numerically.
const NUMERIC_KEYS: &[&str] = &[
    "text_length",
    "value_length",
    "child_count",
    "scroll_top",
    "scroll_height",
    "opacity",
    "width",
    "height",
];

/// Numeric fields default to zero when absent.
fn as_number(key: &str, value: &Value) -> Option<f64> {
    match value {
        Value::Null if NUMERIC_KEYS.contains(&key) => Some(0.0),
        other => other.as_f64(),
    }
}

fn as_text(value: &Value) -> &str {
    value.as_str().unwrap_or("")
}

/// Classify one field change.
pub fn classify(key: &str, before: &Value, after: &Value) -> ChangeType {
    let up = match (as_number(key, before), as_number(key, after)) {
        (Some(b), Some(a)) => Some(a > b),
        _ => None,
    };
    match key {
        "text" => ChangeType::TextChanged,
        "text_length" => match up {
            Some(true) => ChangeType::TextGrew,
            _ => ChangeType::TextShrank,
        },
        "value" => {
            let (b, a) = (as_text(before), as_text(after));
            if a.is_empty() && !b.is_empty() {
                ChangeType::InputCleared
            } else if b.is_empty() && !a.is_empty() {
                ChangeType::InputFilled
            } else {
                ChangeType::ValueChanged
            }
        }
        "value_length" => ChangeType::ValueChanged,
        "checked" => ChangeType::Toggled,
        "selected" => ChangeType::SelectionChanged,
        "child_count" => match up {
            Some(true) => ChangeType::ChildrenAdded,
            _ => ChangeType::ChildrenRemoved,
        },
        "scroll_top" => ChangeType::Scrolled,
        "scroll_height" => match up {
            Some(true) => ChangeType::ContentGrew,
            _ => ChangeType::ContentShrank,
        },
        "is_scrollable" => ChangeType::ScrollabilityChanged,
        "display" => {
            if as_text(before) == "none" {
                ChangeType::BecameVisible
            } else if as_text(after) == "none" {
                ChangeType::BecameHidden
            } else {
                ChangeType::DisplayChanged
            }
        }
        "visibility" => {
            if as_text(after) == "hidden" {
                ChangeType::BecameHidden
            } else if as_text(before) == "hidden" {
                ChangeType::BecameVisible
            } else {
                ChangeType::DisplayChanged
            }
        }
        "opacity" => match (as_number(key, before), as_number(key, after)) {
            (Some(b), Some(a)) if b <= 0.0 && a > 0.0 => ChangeType::BecameVisible,
            (Some(b), Some(a)) if b > 0.0 && a <= 0.0 => ChangeType::BecameHidden,
            _ => ChangeType::OpacityChanged,
        },
        "position" => ChangeType::PositionChanged,
        "width" | "height" => ChangeType::Resized,
        "aria-expanded" => {
            if as_text(after) == "true" {
                ChangeType::Expanded
            } else {
                ChangeType::Collapsed
            }
        }
        k if k.starts_with("aria-") => ChangeType::AriaChanged,
        k if k.starts_with("data-") => ChangeType::DataChanged,
        _ => ChangeType::Changed,
    }
}

/// Diff two snapshots. Output is ordered by path, and by field order within
/// a path.
pub fn diff(before: &Snapshot, after: &Snapshot) -> Diff {
    let mut out = Diff::default();

    for (path, after_rec) in &after.elements {
        let Some(before_rec) = before.elements.get(path) else {
            out.added.push(path.clone());
            continue;
        };
        if before_rec == after_rec {
            continue;
        }

        let before_fields: BTreeMap<String, Value> = before_rec.fields().into_iter().collect();
        let after_fields = after_rec.fields();
        let mut keys: Vec<String> = after_fields.iter().map(|(k, _)| k.clone()).collect();
        let after_map: BTreeMap<String, Value> = after_fields.into_iter().collect();
        for (k, _) in before_rec.fields() {
            if !after_map.contains_key(&k) {
                keys.push(k);
            }
        }

        let mut changes = Vec::new();
        for key in keys {
            let b = before_fields.get(&key).cloned().unwrap_or(Value::Null);
            let a = after_map.get(&key).cloned().unwrap_or(Value::Null);
            if b == a {
                continue;
            }
            if NUMERIC_KEYS.contains(&key.as_str()) {
                if let (Some(bn), Some(an)) = (as_number(&key, &b), as_number(&key, &a)) {
                    let shift = NumericShift {
                        path: path.clone(),
                        key: key.clone(),
                        before: bn,
                        after: an,
                    };
                    if an > bn {
                        out.increased.push(shift);
                    } else if an < bn {
                        out.decreased.push(shift);
                    }
                }
            }
            let change_type = classify(&key, &b, &a);
            *out.summary.by_type.entry(change_type).or_insert(0) += 1;
            changes.push(FieldChange {
                key,
                before: b,
                after: a,
                change_type,
            });
        }

        if !changes.is_empty() {
            out.changed.push(ChangedEntry {
                path: path.clone(),
                changes,
                out_of_flow: after_rec.is_out_of_flow(),
            });
        }
    }

    out.removed = before
        .elements
        .keys()
        .filter(|p| !after.elements.contains_key(*p))
        .cloned()
        .collect();

    out.summary.changed = out.changed.len();
    out.summary.added = out.added.len();
    out.summary.removed = out.removed.len();
    out.summary.increased = out.increased.len();
    out.summary.decreased = out.decreased.len();
    out
}

/// Zero-configuration heuristics over a diff. Each rule is independent, so
/// a diff may match several patterns.
pub fn detect_pattern(diff: &Diff) -> Vec<QuickMatch> {
    let mut matches = Vec::new();
    let paths_with = |t: ChangeType| -> Vec<String> {
        diff.entries_with(t).map(|e| e.path.clone()).collect()
    };

    let cleared = paths_with(ChangeType::InputCleared);
    let grown = paths_with(ChangeType::ChildrenAdded);

    if !cleared.is_empty() && !grown.is_empty() {
        let paths: BTreeSet<String> = cleared.iter().chain(grown.iter()).cloned().collect();
        matches.push(QuickMatch {
            pattern: Pattern::Chat,
            confidence: 0.95,
            evidence: "input cleared while children were added".to_string(),
            paths: paths.into_iter().collect(),
        });
    }

    if cleared.len() >= 2 {
        matches.push(QuickMatch {
            pattern: Pattern::Form,
            confidence: 0.85,
            evidence: format!("{} inputs cleared", cleared.len()),
            paths: cleared.clone(),
        });
    }

    let toggled: Vec<String> = diff
        .changed
        .iter()
        .filter(|e| e.changes.iter().any(|c| c.key == "aria-expanded"))
        .map(|e| e.path.clone())
        .collect();
    if !toggled.is_empty() {
        matches.push(QuickMatch {
            pattern: Pattern::Dropdown,
            confidence: 0.9,
            evidence: "aria-expanded changed".to_string(),
            paths: toggled,
        });
    }

    let shown: Vec<String> = diff
        .entries_with(ChangeType::BecameVisible)
        .filter(|e| e.out_of_flow)
        .map(|e| e.path.clone())
        .collect();
    if !shown.is_empty() {
        matches.push(QuickMatch {
            pattern: Pattern::Modal,
            confidence: 0.85,
            evidence: "fixed/absolute node became visible".to_string(),
            paths: shown,
        });
    }

    matches
}
