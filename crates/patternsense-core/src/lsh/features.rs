//! Structural feature tokens of a subtree.

use std::collections::{BTreeSet, HashMap};

use patternsense_protocols::{DocumentEnv, DocumentEnvExt, NodeId};

/// Number of leading child tags folded into the shape token.
const SHAPE_WIDTH: usize = 5;

/// `<=2` exact, then `3-4`, `5-8`, `9+`.
pub(crate) fn bucket(n: usize) -> String {
    match n {
        0..=2 => n.to_string(),
        3..=4 => "3-4".to_string(),
        5..=8 => "5-8".to_string(),
        _ => "9+".to_string(),
    }
}

/// Pre-order feature sequence of `node`, descending at most `max_depth`
/// levels below it.
pub(crate) fn extract(env: &dyn DocumentEnv, node: NodeId, max_depth: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![(node, 0usize)];
    let mut visited = 0usize;

    while let Some((current, depth)) = stack.pop() {
        visited += 1;
        if visited > patternsense_protocols::dom_ext::MAX_WALK_NODES {
            break;
        }
        let Ok(tag) = env.tag_name(current) else {
            continue;
        };
        let children = env.child_nodes(current);
        node_tokens(env, current, &tag, depth, &children, &mut out);

        if depth < max_depth {
            for child in children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
    }
    out
}

fn node_tokens(
    env: &dyn DocumentEnv,
    node: NodeId,
    tag: &str,
    depth: usize,
    children: &[NodeId],
    out: &mut Vec<String>,
) {
    out.push(format!("tag:{}", tag.to_ascii_lowercase()));
    out.push(format!("d:{}", bucket(depth)));
    out.push(format!("c:{}", bucket(children.len())));

    if env.is_scrollable(node) {
        out.push("scrollable".to_string());
    }
    if env.is_fixed_or_absolute(node) {
        out.push("fixed".to_string());
    }
    if children.iter().any(|c| env.is_text_input(*c)) {
        out.push("has-input".to_string());
    }
    if children.iter().any(|c| env.is_button(*c)) {
        out.push("has-button".to_string());
    }

    if let Some(role) = env.attr(node, "role") {
        out.push(format!("role:{}", role.to_ascii_lowercase()));
    }
    let aria: BTreeSet<String> = env
        .attributes(node)
        .unwrap_or_default()
        .into_iter()
        .filter(|(name, _)| name.starts_with("aria-"))
        .map(|(name, _)| name)
        .collect();
    for name in aria {
        out.push(format!("aria:{}", name));
    }

    if !children.is_empty() {
        let tags: Vec<String> = children.iter().map(|c| env.tag(*c)).collect();
        let shape: Vec<&str> = tags.iter().take(SHAPE_WIDTH).map(String::as_str).collect();
        out.push(format!("shape:{}", shape.join(",")));

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for t in &tags {
            *counts.entry(t.as_str()).or_insert(0) += 1;
        }
        let max = counts.values().copied().max().unwrap_or(0);
        out.push(format!("rep:{}", bucket(max)));
    }
}

/// Sliding windows of `size` tokens joined with `|`. A sequence shorter
/// than the window yields one shingle of everything.
pub(crate) fn shingles(features: &[String], size: usize) -> BTreeSet<String> {
    let size = size.max(1);
    if features.is_empty() {
        return BTreeSet::new();
    }
    if features.len() < size {
        return BTreeSet::from([features.join("|")]);
    }
    features.windows(size).map(|w| w.join("|")).collect()
}
