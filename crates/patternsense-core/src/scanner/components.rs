//! Component discovery and the behavioral signal derived from it.

use patternsense_protocols::{Components, DocumentEnvExt, NodeId, Pattern};

use super::rules::{Subtree, has_repeated_children, repeated_items};

const ACCEPT_WORDS: &[&str] = &["accept", "agree", "allow", "ok"];
const REJECT_WORDS: &[&str] = &["reject", "decline", "deny", "necessary"];

/// Components of `pattern` inside the subtree plus a behavioral score in
/// `{0, 0.5, 1}`.
pub(crate) fn discover(tree: &Subtree<'_>, pattern: Pattern) -> (Components, f64) {
    match pattern {
        Pattern::Chat => chat(tree),
        Pattern::Form => form(tree),
        Pattern::Dropdown => dropdown(tree),
        Pattern::Modal => modal(tree),
        Pattern::Login => login(tree),
        Pattern::Search => search(tree),
        Pattern::Feed => feed(tree),
        Pattern::CookieBanner => cookie_banner(tree),
    }
}

fn score(full: bool, partial: bool) -> f64 {
    if full {
        1.0
    } else if partial {
        0.5
    } else {
        0.0
    }
}

fn chat(tree: &Subtree<'_>) -> (Components, f64) {
    let env = tree.env;
    let input = tree.find(|n| env.is_text_input(n) && !tree.is_password(n));
    let container = tree.find(|n| env.is_scrollable(n) || has_repeated_children(env, n));
    let send_button = tree.find(|n| env.is_button(n));
    let items = container
        .map(|c| {
            let repeated = repeated_items(env, c);
            if repeated.is_empty() { env.child_nodes(c) } else { repeated }
        })
        .unwrap_or_default();

    let filled = container.is_some_and(|c| !env.child_nodes(c).is_empty());
    let behavioral = score(input.is_some() && filled, container.is_some());
    (
        Components {
            input,
            container,
            send_button,
            items,
            ..Default::default()
        },
        behavioral,
    )
}

fn form(tree: &Subtree<'_>) -> (Components, f64) {
    let inputs: Vec<NodeId> = tree
        .nodes
        .iter()
        .copied()
        .filter(|n| tree.is_fillable(*n))
        .collect();
    let submit_button = tree.find(|n| tree.is_submit(n));

    let behavioral = score(
        inputs.len() >= 2 && submit_button.is_some(),
        (!inputs.is_empty() && submit_button.is_some()) || inputs.len() >= 2,
    );
    (
        Components {
            input: inputs.first().copied(),
            container: Some(tree.root),
            submit_button,
            inputs,
            ..Default::default()
        },
        behavioral,
    )
}

fn dropdown(tree: &Subtree<'_>) -> (Components, f64) {
    let env = tree.env;
    let trigger = tree
        .find(|n| env.has_attr(n, "aria-expanded") || env.has_attr(n, "aria-haspopup"))
        .or_else(|| tree.find(|n| matches!(env.tag(n).as_str(), "summary" | "select")))
        .or_else(|| tree.find(|n| env.is_button(n)));

    let controlled = trigger
        .and_then(|t| env.attr(t, "aria-controls"))
        .and_then(|id| {
            env.all_nodes()
                .into_iter()
                .find(|n| env.attr(*n, "id").as_deref() == Some(id.as_str()))
        });
    let menu = controlled.or_else(|| {
        tree.find(|n| {
            let is_select = env.tag(n) == "select";
            (tree.is_popup_list(n) && (Some(n) != trigger || is_select))
                || matches!(env.tag(n).as_str(), "ul" | "ol")
        })
    });
    let items = menu.map(|m| env.child_nodes(m)).unwrap_or_default();

    let behavioral = score(
        trigger.is_some() && menu.is_some() && !items.is_empty(),
        trigger.is_some() || menu.is_some(),
    );
    (
        Components {
            trigger,
            menu,
            container: menu,
            items,
            ..Default::default()
        },
        behavioral,
    )
}

fn modal(tree: &Subtree<'_>) -> (Components, f64) {
    let env = tree.env;
    let close_button = tree.find(|n| n != tree.root && tree.is_close_button(n));
    let has_content = env
        .child_nodes(tree.root)
        .iter()
        .any(|c| Some(*c) != close_button);

    let behavioral = score(
        close_button.is_some() && has_content,
        close_button.is_some() || has_content,
    );
    (
        Components {
            container: Some(tree.root),
            close_button,
            ..Default::default()
        },
        behavioral,
    )
}

fn login(tree: &Subtree<'_>) -> (Components, f64) {
    let env = tree.env;
    let password_input = tree.find(|n| tree.is_password(n));
    let username_input = tree.find(|n| env.is_text_input(n) && !tree.is_password(n));
    let submit_button = tree
        .find(|n| tree.is_submit(n))
        .or_else(|| tree.find(|n| env.is_button(n)));

    let behavioral = score(
        password_input.is_some() && username_input.is_some() && submit_button.is_some(),
        password_input.is_some() && (username_input.is_some() || submit_button.is_some()),
    );
    (
        Components {
            input: username_input,
            container: Some(tree.root),
            password_input,
            username_input,
            submit_button,
            ..Default::default()
        },
        behavioral,
    )
}

fn search(tree: &Subtree<'_>) -> (Components, f64) {
    let env = tree.env;
    let input = tree
        .find(|n| tree.is_search_input(n))
        .or_else(|| tree.find(|n| env.is_text_input(n) && !tree.is_password(n)));
    let submit_button = tree.find(|n| env.is_button(n));

    let behavioral = score(input.is_some() && submit_button.is_some(), input.is_some());
    (
        Components {
            input,
            container: Some(tree.root),
            submit_button,
            ..Default::default()
        },
        behavioral,
    )
}

fn feed(tree: &Subtree<'_>) -> (Components, f64) {
    let env = tree.env;
    let container = tree.find(|n| has_repeated_children(env, n));
    let items = container.map(|c| repeated_items(env, c)).unwrap_or_default();

    let behavioral = score(items.len() >= 3, items.len() == 2);
    (
        Components {
            container,
            items,
            ..Default::default()
        },
        behavioral,
    )
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn cookie_banner(tree: &Subtree<'_>) -> (Components, f64) {
    let env = tree.env;
    let mut accept_button = None;
    let mut reject_button = None;
    for node in tree.nodes.iter().copied().filter(|n| env.is_button(*n)) {
        let label = env.button_text(node);
        let tokens = words(&label);
        let has = |list: &[&str]| tokens.iter().any(|t| list.contains(&t.as_str()));
        if has(REJECT_WORDS) {
            reject_button.get_or_insert(node);
        } else if has(ACCEPT_WORDS) || label.to_lowercase().contains("got it") {
            accept_button.get_or_insert(node);
        }
    }

    let behavioral = score(
        accept_button.is_some() && reject_button.is_some(),
        accept_button.is_some(),
    );
    (
        Components {
            container: Some(tree.root),
            accept_button,
            reject_button,
            ..Default::default()
        },
        behavioral,
    )
}
