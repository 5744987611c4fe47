//! Per-pattern candidate discovery configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

/// A structural predicate evaluated against a candidate subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralRule {
    /// Contains a text-entry control.
    HasTextInput,
    /// Contains two or more fillable controls.
    HasMultipleInputs,
    HasPasswordInput,
    /// `input[type=search]` or a text input inside `role=search`.
    HasSearchInput,
    HasButton,
    /// A submit button, or a plain button inside a form.
    HasSubmitButton,
    /// Is or contains a scrollable box.
    HasScrollableArea,
    /// Some node in the subtree has at least two same-shaped children.
    HasRepeatedChildren,
    /// Is or contains a `<form>`.
    HasFormElement,
    HasLabels,
    HasAriaExpanded,
    /// A listbox/menu/list that can pop up.
    HasPopupList,
    IsFixedOrAbsolute,
    HasHighZIndex,
    HasDialogRole,
    HasCloseButton,
    /// `<article>` or `role=article` items.
    HasArticleItems,
    HasLinks,
    /// Pinned to the top or bottom viewport edge.
    IsEdgeAnchored,
    IsVisible,
}

impl StructuralRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralRule::HasTextInput => "has_text_input",
            StructuralRule::HasMultipleInputs => "has_multiple_inputs",
            StructuralRule::HasPasswordInput => "has_password_input",
            StructuralRule::HasSearchInput => "has_search_input",
            StructuralRule::HasButton => "has_button",
            StructuralRule::HasSubmitButton => "has_submit_button",
            StructuralRule::HasScrollableArea => "has_scrollable_area",
            StructuralRule::HasRepeatedChildren => "has_repeated_children",
            StructuralRule::HasFormElement => "has_form_element",
            StructuralRule::HasLabels => "has_labels",
            StructuralRule::HasAriaExpanded => "has_aria_expanded",
            StructuralRule::HasPopupList => "has_popup_list",
            StructuralRule::IsFixedOrAbsolute => "is_fixed_or_absolute",
            StructuralRule::HasHighZIndex => "has_high_z_index",
            StructuralRule::HasDialogRole => "has_dialog_role",
            StructuralRule::HasCloseButton => "has_close_button",
            StructuralRule::HasArticleItems => "has_article_items",
            StructuralRule::HasLinks => "has_links",
            StructuralRule::IsEdgeAnchored => "is_edge_anchored",
            StructuralRule::IsVisible => "is_visible",
        }
    }

    pub const ALL: [StructuralRule; 20] = [
        StructuralRule::HasTextInput,
        StructuralRule::HasMultipleInputs,
        StructuralRule::HasPasswordInput,
        StructuralRule::HasSearchInput,
        StructuralRule::HasButton,
        StructuralRule::HasSubmitButton,
        StructuralRule::HasScrollableArea,
        StructuralRule::HasRepeatedChildren,
        StructuralRule::HasFormElement,
        StructuralRule::HasLabels,
        StructuralRule::HasAriaExpanded,
        StructuralRule::HasPopupList,
        StructuralRule::IsFixedOrAbsolute,
        StructuralRule::HasHighZIndex,
        StructuralRule::HasDialogRole,
        StructuralRule::HasCloseButton,
        StructuralRule::HasArticleItems,
        StructuralRule::HasLinks,
        StructuralRule::IsEdgeAnchored,
        StructuralRule::IsVisible,
    ];
}

impl FromStr for StructuralRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        StructuralRule::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| format!("unknown structural rule: {}", s))
    }
}

impl fmt::Display for StructuralRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to find and structurally score candidates for one pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSpec {
    #[serde(default)]
    pub selectors: Vec<String>,

    #[serde(default)]
    pub rules: BTreeMap<StructuralRule, f64>,

    /// Also consider any node whose children repeat a tag/class shape.
    #[serde(default)]
    pub scan_repeated_children: bool,
}

impl PatternSpec {
    pub fn new(selectors: &[&str], rules: &[(StructuralRule, f64)], scan_repeated_children: bool) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            rules: rules.iter().copied().collect(),
            scan_repeated_children,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.rules.values().sum()
    }

    /// Built-in spec for a pattern.
    pub fn builtin(pattern: Pattern) -> Self {
        use StructuralRule::*;
        match pattern {
            Pattern::Chat => Self::new(
                &[
                    "[class*=chat]",
                    "[id*=chat]",
                    "[class*=message]",
                    "[class*=conversation]",
                    "[role=log]",
                    "[aria-live]",
                ],
                &[
                    (HasTextInput, 3.0),
                    (HasScrollableArea, 3.0),
                    (HasRepeatedChildren, 3.0),
                ],
                true,
            ),
            Pattern::Form => Self::new(
                &["form", "[role=form]"],
                &[
                    (HasFormElement, 3.0),
                    (HasMultipleInputs, 3.0),
                    (HasSubmitButton, 2.0),
                    (HasLabels, 1.0),
                ],
                false,
            ),
            Pattern::Dropdown => Self::new(
                &[
                    "[aria-haspopup]",
                    "[class*=dropdown]",
                    "[role=combobox]",
                    "select",
                    "details",
                ],
                &[
                    (HasAriaExpanded, 3.0),
                    (HasPopupList, 3.0),
                    (HasButton, 1.0),
                ],
                false,
            ),
            Pattern::Modal => Self::new(
                &[
                    "[role=dialog]",
                    "[role=alertdialog]",
                    "[aria-modal=true]",
                    "dialog",
                    "[class*=modal]",
                ],
                &[
                    (HasDialogRole, 3.0),
                    (IsFixedOrAbsolute, 2.0),
                    (HasCloseButton, 2.0),
                    (HasHighZIndex, 1.0),
                    (IsVisible, 1.0),
                ],
                false,
            ),
            Pattern::Login => Self::new(
                &[
                    "form",
                    "[class*=login]",
                    "[id*=login]",
                    "[class*=signin]",
                    "[class*=sign-in]",
                ],
                &[
                    (HasPasswordInput, 4.0),
                    (HasTextInput, 2.0),
                    (HasSubmitButton, 2.0),
                ],
                false,
            ),
            Pattern::Search => Self::new(
                &[
                    "[role=search]",
                    "[class*=search]",
                    "[id*=search]",
                    "form",
                ],
                &[
                    (HasSearchInput, 4.0),
                    (HasTextInput, 1.0),
                    (HasButton, 1.0),
                ],
                false,
            ),
            Pattern::Feed => Self::new(
                &[
                    "[role=feed]",
                    "[class*=feed]",
                    "[class*=timeline]",
                    "main",
                    "ul",
                    "ol",
                ],
                &[
                    (HasRepeatedChildren, 3.0),
                    (HasArticleItems, 2.0),
                    (HasScrollableArea, 2.0),
                    (HasLinks, 1.0),
                ],
                true,
            ),
            Pattern::CookieBanner => Self::new(
                &[
                    "[class*=cookie]",
                    "[id*=cookie]",
                    "[class*=consent]",
                    "[id*=consent]",
                    "[aria-label*=cookie]",
                ],
                &[
                    (IsFixedOrAbsolute, 2.0),
                    (IsEdgeAnchored, 2.0),
                    (HasButton, 2.0),
                    (IsVisible, 1.0),
                ],
                false,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_chat_weights() {
        let spec = PatternSpec::builtin(Pattern::Chat);
        assert_eq!(spec.total_weight(), 9.0);
        assert!(spec.scan_repeated_children);
    }

    #[test]
    fn test_every_builtin_has_rules_and_selectors() {
        for pattern in Pattern::ALL {
            let spec = PatternSpec::builtin(pattern);
            assert!(!spec.selectors.is_empty(), "{} has no selectors", pattern);
            assert!(spec.total_weight() > 0.0, "{} has no rules", pattern);
        }
    }

    #[test]
    fn test_spec_from_toml_like_json() {
        let json = r#"{
            "selectors": [".chat"],
            "rules": {"has_text_input": 2.0, "has_button": 1.0},
            "scan_repeated_children": true
        }"#;
        let spec: PatternSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.rules[&StructuralRule::HasTextInput], 2.0);
        assert_eq!(spec.total_weight(), 3.0);
    }

    #[test]
    fn test_rule_from_str() {
        for rule in StructuralRule::ALL {
            assert_eq!(rule.as_str().parse::<StructuralRule>().unwrap(), rule);
        }
        assert_eq!(
            "has-text-input".parse::<StructuralRule>().unwrap(),
            StructuralRule::HasTextInput
        );
        assert!("has_magic".parse::<StructuralRule>().is_err());
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let json = r#"{"rules": {"has_magic": 1.0}}"#;
        assert!(serde_json::from_str::<PatternSpec>(json).is_err());
    }
}
