//! Accessibility-signal predicates, one per pattern. Binary: 1.0 or 0.0.

use patternsense_protocols::{DocumentEnvExt, NodeId, Pattern};

use super::rules::Subtree;

const LOGIN_AUTOCOMPLETE: &[&str] = &["username", "current-password", "email"];
const DROPDOWN_ROLES: &[&str] = &["combobox", "listbox", "menu", "menubar"];
const COOKIE_ROLES: &[&str] = &["dialog", "alertdialog", "region", "banner", "complementary"];

pub(crate) fn semantic_score(tree: &Subtree<'_>, pattern: Pattern) -> f64 {
    if holds(tree, pattern) { 1.0 } else { 0.0 }
}

fn role(tree: &Subtree<'_>, node: NodeId) -> String {
    tree.env
        .attr(node, "role")
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn holds(tree: &Subtree<'_>, pattern: Pattern) -> bool {
    let env = tree.env;
    match pattern {
        Pattern::Chat => tree.any(|n| role(tree, n) == "log" || env.has_attr(n, "aria-live")),
        Pattern::Form => tree.any(|n| env.tag(n) == "form" || role(tree, n) == "form"),
        Pattern::Dropdown => tree.any(|n| {
            env.has_attr(n, "aria-haspopup")
                || DROPDOWN_ROLES.contains(&role(tree, n).as_str())
                || env.tag(n) == "select"
        }),
        Pattern::Modal => tree.any(|n| tree.is_dialog(n)),
        Pattern::Login => tree.any(|n| {
            env.attr(n, "autocomplete")
                .map(|a| LOGIN_AUTOCOMPLETE.contains(&a.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        }),
        Pattern::Search => tree.any(|n| role(tree, n) == "search" || tree.is_search_input(n)),
        Pattern::Feed => {
            tree.any(|n| role(tree, n) == "feed") || tree.count(|n| tree.is_article(n)) >= 2
        }
        Pattern::CookieBanner => {
            COOKIE_ROLES.contains(&role(tree, tree.root).as_str())
                || tree.any(|n| {
                    let label = env.attr(n, "aria-label").unwrap_or_default().to_lowercase();
                    ["cookie", "consent", "privacy"]
                        .iter()
                        .any(|w| label.contains(w))
                })
        }
    }
}
