//! Action/mutation matching rules, tried in declaration order.

use patternsense_protocols::{Components, DocumentEnv, DocumentEnvExt, InteractionKind, Pattern};

use super::record::{ActionEntry, MutationEntry, NodeInfo};

pub(crate) const DROPDOWN_CONFIDENCE: f64 = 0.9;
pub(crate) const DIALOG_CONFIDENCE: f64 = 0.95;
pub(crate) const OVERLAY_CONFIDENCE: f64 = 0.75;
pub(crate) const CHAT_CONFIDENCE: f64 = 0.85;
pub(crate) const FEED_CONFIDENCE: f64 = 0.7;

/// A rule hit before thresholding and deduplication.
#[derive(Debug, Clone)]
pub(crate) struct Inference {
    pub pattern: Pattern,
    pub confidence: f64,
    pub evidence: String,
    pub container: NodeInfo,
    pub parts: Components,
}

/// First matching rule for `action` given the mutations in its window.
pub(crate) fn infer(
    env: &dyn DocumentEnv,
    action: &ActionEntry,
    mutations: &[&MutationEntry],
) -> Option<Inference> {
    dropdown(action, mutations)
        .or_else(|| modal(action, mutations))
        .or_else(|| chat(action, mutations))
        .or_else(|| feed(env, action, mutations))
}

fn dropdown(action: &ActionEntry, mutations: &[&MutationEntry]) -> Option<Inference> {
    if action.event.kind != InteractionKind::Click {
        return None;
    }
    let trigger = action.expandable.as_ref()?;
    mutations
        .iter()
        .find(|m| m.record.target == trigger.node && m.is_attribute("aria-expanded"))?;
    Some(Inference {
        pattern: Pattern::Dropdown,
        confidence: DROPDOWN_CONFIDENCE,
        evidence: format!("click on <{}> toggled aria-expanded", trigger.tag),
        container: trigger.clone(),
        parts: Components {
            trigger: Some(trigger.node),
            ..Default::default()
        },
    })
}

fn modal(action: &ActionEntry, mutations: &[&MutationEntry]) -> Option<Inference> {
    if action.event.kind != InteractionKind::Click {
        return None;
    }
    let appearances = || mutations.iter().flat_map(|m| m.appearances.iter());
    let (found, confidence, evidence) = if let Some(a) = appearances().find(|a| a.dialog) {
        (a, DIALOG_CONFIDENCE, "click revealed a dialog")
    } else {
        let a = appearances().find(|a| a.large_overlay)?;
        (a, OVERLAY_CONFIDENCE, "click revealed a large overlay")
    };
    Some(Inference {
        pattern: Pattern::Modal,
        confidence,
        evidence: evidence.to_string(),
        container: found.info.clone(),
        parts: Components {
            container: Some(found.info.node),
            ..Default::default()
        },
    })
}

fn chat(action: &ActionEntry, mutations: &[&MutationEntry]) -> Option<Inference> {
    if !action.is_enter() || !action.text_input {
        return None;
    }
    let grown = mutations.iter().find(|m| m.added_children())?;
    Some(Inference {
        pattern: Pattern::Chat,
        confidence: CHAT_CONFIDENCE,
        evidence: format!("enter in input added children to <{}>", grown.target.tag),
        container: grown.target.clone(),
        parts: Components {
            input: Some(action.target.node),
            container: Some(grown.target.node),
            ..Default::default()
        },
    })
}

fn feed(env: &dyn DocumentEnv, action: &ActionEntry, mutations: &[&MutationEntry]) -> Option<Inference> {
    if action.event.kind != InteractionKind::Scroll || !action.at_bottom {
        return None;
    }
    let scroller = &action.target;
    let grown = mutations
        .iter()
        .find(|m| m.added_children() && env.contains(scroller.node, m.record.target))?;
    Some(Inference {
        pattern: Pattern::Feed,
        confidence: FEED_CONFIDENCE,
        evidence: format!("scroll to bottom loaded children into <{}>", grown.target.tag),
        container: scroller.clone(),
        parts: Components {
            container: Some(scroller.node),
            ..Default::default()
        },
    })
}
