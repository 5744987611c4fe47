//! Named actions per pattern and the checks that bracket them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use patternsense_protocols::Pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyAction {
    Send,
    Submit,
    Open,
    Close,
    Dismiss,
    LoadMore,
    Accept,
    Reject,
}

impl VerifyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyAction::Send => "send",
            VerifyAction::Submit => "submit",
            VerifyAction::Open => "open",
            VerifyAction::Close => "close",
            VerifyAction::Dismiss => "dismiss",
            VerifyAction::LoadMore => "load_more",
            VerifyAction::Accept => "accept",
            VerifyAction::Reject => "reject",
        }
    }
}

impl fmt::Display for VerifyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerifyAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "send" => Ok(VerifyAction::Send),
            "submit" => Ok(VerifyAction::Submit),
            "open" => Ok(VerifyAction::Open),
            "close" => Ok(VerifyAction::Close),
            "dismiss" => Ok(VerifyAction::Dismiss),
            "load_more" | "loadmore" => Ok(VerifyAction::LoadMore),
            "accept" => Ok(VerifyAction::Accept),
            "reject" => Ok(VerifyAction::Reject),
            other => Err(format!("unknown action: {}", other)),
        }
    }
}

/// A named predicate over the document and the bound components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    // Preconditions
    InputPresent,
    InputHasValue,
    InputsPresent,
    PasswordPresent,
    ContainerPresent,
    ContainerVisible,
    TriggerPresent,
    TriggerCollapsed,
    TriggerExpanded,
    SubmitPresent,
    ClosePresent,
    AcceptPresent,
    RejectPresent,
    // Postconditions
    InputCleared,
    ChildCountIncreased,
    Expanded,
    Collapsed,
    MenuVisible,
    MenuHidden,
    ContainerHidden,
    /// Inputs changed, or the container changed shape or disappeared.
    SubmissionObserved,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Check::InputPresent => "input_present",
            Check::InputHasValue => "input_has_value",
            Check::InputsPresent => "inputs_present",
            Check::PasswordPresent => "password_present",
            Check::ContainerPresent => "container_present",
            Check::ContainerVisible => "container_visible",
            Check::TriggerPresent => "trigger_present",
            Check::TriggerCollapsed => "trigger_collapsed",
            Check::TriggerExpanded => "trigger_expanded",
            Check::SubmitPresent => "submit_present",
            Check::ClosePresent => "close_present",
            Check::AcceptPresent => "accept_present",
            Check::RejectPresent => "reject_present",
            Check::InputCleared => "input_cleared",
            Check::ChildCountIncreased => "child_count_increased",
            Check::Expanded => "expanded",
            Check::Collapsed => "collapsed",
            Check::MenuVisible => "menu_visible",
            Check::MenuHidden => "menu_hidden",
            Check::ContainerHidden => "container_hidden",
            Check::SubmissionObserved => "submission_observed",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A postcondition and how long it may take to become true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostCheck {
    pub check: Check,
    pub timeout_ms: u64,
}

const fn post(check: Check, timeout_ms: u64) -> PostCheck {
    PostCheck { check, timeout_ms }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub action: VerifyAction,
    pub preconditions: &'static [Check],
    pub postconditions: &'static [PostCheck],
}

/// Actions defined for `pattern`, in declaration order.
pub fn actions_for(pattern: Pattern) -> &'static [ActionSpec] {
    match pattern {
        Pattern::Chat => CHAT,
        Pattern::Form => FORM,
        Pattern::Login => LOGIN,
        Pattern::Search => SEARCH,
        Pattern::Dropdown => DROPDOWN,
        Pattern::Modal => MODAL,
        Pattern::Feed => FEED,
        Pattern::CookieBanner => COOKIE_BANNER,
    }
}

pub fn action_spec(pattern: Pattern, action: VerifyAction) -> Option<&'static ActionSpec> {
    actions_for(pattern).iter().find(|s| s.action == action)
}

static CHAT: &[ActionSpec] = &[ActionSpec {
    action: VerifyAction::Send,
    preconditions: &[Check::InputPresent, Check::InputHasValue, Check::ContainerPresent],
    postconditions: &[post(Check::InputCleared, 1000), post(Check::ChildCountIncreased, 3000)],
}];

static FORM: &[ActionSpec] = &[ActionSpec {
    action: VerifyAction::Submit,
    preconditions: &[Check::InputsPresent, Check::SubmitPresent],
    postconditions: &[post(Check::SubmissionObserved, 3000)],
}];

static LOGIN: &[ActionSpec] = &[ActionSpec {
    action: VerifyAction::Submit,
    preconditions: &[Check::PasswordPresent, Check::SubmitPresent],
    postconditions: &[post(Check::SubmissionObserved, 5000)],
}];

static SEARCH: &[ActionSpec] = &[ActionSpec {
    action: VerifyAction::Submit,
    preconditions: &[Check::InputPresent, Check::InputHasValue],
    postconditions: &[post(Check::SubmissionObserved, 3000)],
}];

static DROPDOWN: &[ActionSpec] = &[
    ActionSpec {
        action: VerifyAction::Open,
        preconditions: &[Check::TriggerPresent, Check::TriggerCollapsed],
        postconditions: &[post(Check::Expanded, 500), post(Check::MenuVisible, 500)],
    },
    ActionSpec {
        action: VerifyAction::Close,
        preconditions: &[Check::TriggerPresent, Check::TriggerExpanded],
        postconditions: &[post(Check::Collapsed, 500), post(Check::MenuHidden, 500)],
    },
];

static MODAL: &[ActionSpec] = &[ActionSpec {
    action: VerifyAction::Dismiss,
    preconditions: &[Check::ContainerVisible, Check::ClosePresent],
    postconditions: &[post(Check::ContainerHidden, 1000)],
}];

static FEED: &[ActionSpec] = &[ActionSpec {
    action: VerifyAction::LoadMore,
    preconditions: &[Check::ContainerPresent],
    postconditions: &[post(Check::ChildCountIncreased, 5000)],
}];

static COOKIE_BANNER: &[ActionSpec] = &[
    ActionSpec {
        action: VerifyAction::Accept,
        preconditions: &[Check::ContainerVisible, Check::AcceptPresent],
        postconditions: &[post(Check::ContainerHidden, 1000)],
    },
    ActionSpec {
        action: VerifyAction::Reject,
        preconditions: &[Check::ContainerVisible, Check::RejectPresent],
        postconditions: &[post(Check::ContainerHidden, 1000)],
    },
];
