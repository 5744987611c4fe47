//! Pre-action state capture and check evaluation.

use serde::{Deserialize, Serialize};

use patternsense_protocols::{Components, DocumentEnv, DocumentEnvExt, NodeId};

use super::actions::Check;

/// Document state captured right before an action runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateCapture {
    pub input_value: Option<String>,
    #[serde(default)]
    pub input_values: Vec<Option<String>>,
    pub child_count: Option<usize>,
    pub scroll_top: Option<f64>,
    pub aria_expanded: Option<String>,
    pub menu_visible: bool,
    pub trigger_text: Option<String>,
    pub container_visible: bool,
}

fn readable(env: &dyn DocumentEnv, node: Option<NodeId>) -> bool {
    node.is_some_and(|n| env.tag_name(n).is_ok())
}

fn expanded(env: &dyn DocumentEnv, trigger: NodeId) -> bool {
    env.attr(trigger, "aria-expanded").as_deref() == Some("true") || env.has_attr(trigger, "open")
}

fn child_count(env: &dyn DocumentEnv, node: Option<NodeId>) -> Option<usize> {
    node.and_then(|n| env.children(n).ok()).map(|c| c.len())
}

fn inputs(parts: &Components) -> Vec<NodeId> {
    if parts.inputs.is_empty() {
        parts.input.into_iter().collect()
    } else {
        parts.inputs.clone()
    }
}

impl StateCapture {
    pub fn capture(env: &dyn DocumentEnv, parts: &Components) -> Self {
        let container = parts.container;
        Self {
            input_value: parts.input.and_then(|n| env.current_value(n)),
            input_values: inputs(parts).into_iter().map(|n| env.current_value(n)).collect(),
            child_count: child_count(env, container),
            scroll_top: container
                .and_then(|n| env.scroll_metrics(n).ok())
                .map(|m| m.scroll_top),
            aria_expanded: parts.trigger.and_then(|n| env.attr(n, "aria-expanded")),
            menu_visible: parts.menu.is_some_and(|n| env.is_visible(n)),
            trigger_text: parts.trigger.map(|n| env.text(n).trim().to_string()),
            container_visible: container.is_some_and(|n| env.is_visible(n)),
        }
    }
}

/// Evaluate `check` against the live document. Read faults count as false
/// for presence checks and as "gone" for disappearance checks.
pub(crate) fn evaluate(
    env: &dyn DocumentEnv,
    parts: &Components,
    before: &StateCapture,
    check: Check,
) -> (bool, String) {
    match check {
        Check::InputPresent => flag(readable(env, parts.input), "input"),
        Check::InputHasValue => {
            let value = parts.input.and_then(|n| env.current_value(n)).unwrap_or_default();
            (!value.is_empty(), format!("input value length {}", value.chars().count()))
        }
        Check::InputsPresent => {
            let found = inputs(parts).into_iter().filter(|n| env.tag_name(*n).is_ok()).count();
            (found > 0, format!("{} inputs present", found))
        }
        Check::PasswordPresent => flag(readable(env, parts.password_input), "password input"),
        Check::ContainerPresent => flag(readable(env, parts.container), "container"),
        Check::ContainerVisible => {
            let visible = parts.container.is_some_and(|n| env.is_visible(n));
            (visible, format!("container visible: {}", visible))
        }
        Check::TriggerPresent => flag(readable(env, parts.trigger), "trigger"),
        Check::TriggerCollapsed => {
            let open = parts.trigger.is_some_and(|n| expanded(env, n));
            (readable(env, parts.trigger) && !open, format!("trigger expanded: {}", open))
        }
        Check::TriggerExpanded | Check::Expanded => {
            let open = parts.trigger.is_some_and(|n| expanded(env, n));
            (open, format!("trigger expanded: {}", open))
        }
        Check::Collapsed => {
            let open = parts.trigger.is_some_and(|n| expanded(env, n));
            (!open, format!("trigger expanded: {}", open))
        }
        Check::SubmitPresent => flag(readable(env, parts.submit_button), "submit button"),
        Check::ClosePresent => flag(readable(env, parts.close_button), "close button"),
        Check::AcceptPresent => flag(readable(env, parts.accept_button), "accept button"),
        Check::RejectPresent => flag(readable(env, parts.reject_button), "reject button"),
        Check::InputCleared => {
            let value = parts.input.and_then(|n| env.current_value(n));
            let cleared = readable(env, parts.input) && value.as_deref().unwrap_or("").is_empty();
            (cleared, format!("input value {:?}", value.unwrap_or_default()))
        }
        Check::ChildCountIncreased => {
            let now = child_count(env, parts.container);
            let grew = matches!((before.child_count, now), (Some(b), Some(a)) if a > b);
            (grew, format!("child count {:?} -> {:?}", before.child_count, now))
        }
        Check::MenuVisible => {
            let visible = parts.menu.is_some_and(|n| env.is_visible(n));
            (visible, format!("menu visible: {}", visible))
        }
        Check::MenuHidden => {
            let visible = parts.menu.is_some_and(|n| env.is_visible(n));
            (!visible, format!("menu visible: {}", visible))
        }
        Check::ContainerHidden => {
            let visible = parts.container.is_some_and(|n| env.is_visible(n));
            (!visible, format!("container visible: {}", visible))
        }
        Check::SubmissionObserved => {
            let values: Vec<Option<String>> =
                inputs(parts).into_iter().map(|n| env.current_value(n)).collect();
            if values != before.input_values {
                return (true, "input values changed".to_string());
            }
            let now = child_count(env, parts.container);
            if now != before.child_count {
                return (true, format!("child count {:?} -> {:?}", before.child_count, now));
            }
            let visible = parts.container.is_some_and(|n| env.is_visible(n));
            if before.container_visible && !visible {
                return (true, "container hidden".to_string());
            }
            (false, "no submission side effect".to_string())
        }
    }
}

fn flag(present: bool, what: &str) -> (bool, String) {
    if present {
        (true, format!("{} present", what))
    } else {
        (false, format!("{} missing", what))
    }
}
