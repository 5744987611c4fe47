//! Pattern names and guarantee levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An interaction pattern the engine knows how to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Chat,
    Form,
    Dropdown,
    Modal,
    Login,
    Search,
    Feed,
    CookieBanner,
}

impl Pattern {
    pub const ALL: [Pattern; 8] = [
        Pattern::Chat,
        Pattern::Form,
        Pattern::Dropdown,
        Pattern::Modal,
        Pattern::Login,
        Pattern::Search,
        Pattern::Feed,
        Pattern::CookieBanner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Chat => "chat",
            Pattern::Form => "form",
            Pattern::Dropdown => "dropdown",
            Pattern::Modal => "modal",
            Pattern::Login => "login",
            Pattern::Search => "search",
            Pattern::Feed => "feed",
            Pattern::CookieBanner => "cookie_banner",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "chat" => Ok(Pattern::Chat),
            "form" => Ok(Pattern::Form),
            "dropdown" => Ok(Pattern::Dropdown),
            "modal" => Ok(Pattern::Modal),
            "login" => Ok(Pattern::Login),
            "search" => Ok(Pattern::Search),
            "feed" => Ok(Pattern::Feed),
            "cookie_banner" | "cookie" => Ok(Pattern::CookieBanner),
            other => Err(format!("unknown pattern: {}", other)),
        }
    }
}

/// How strongly a detection has been corroborated.
///
/// Ordered: `Structural < Semantic < Behavioral < Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuaranteeLevel {
    Structural,
    Semantic,
    Behavioral,
    Verified,
}

impl GuaranteeLevel {
    pub const ALL: [GuaranteeLevel; 4] = [
        GuaranteeLevel::Structural,
        GuaranteeLevel::Semantic,
        GuaranteeLevel::Behavioral,
        GuaranteeLevel::Verified,
    ];

    /// Default minimum confidence for a detection to reach this level.
    pub fn default_threshold(&self) -> f64 {
        match self {
            GuaranteeLevel::Structural => 0.2,
            GuaranteeLevel::Semantic => 0.35,
            GuaranteeLevel::Behavioral => 0.5,
            GuaranteeLevel::Verified => 0.7,
        }
    }
}

impl fmt::Display for GuaranteeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuaranteeLevel::Structural => write!(f, "STRUCTURAL"),
            GuaranteeLevel::Semantic => write!(f, "SEMANTIC"),
            GuaranteeLevel::Behavioral => write!(f, "BEHAVIORAL"),
            GuaranteeLevel::Verified => write!(f, "VERIFIED"),
        }
    }
}

impl FromStr for GuaranteeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structural" => Ok(GuaranteeLevel::Structural),
            "semantic" => Ok(GuaranteeLevel::Semantic),
            "behavioral" | "behavioural" => Ok(GuaranteeLevel::Behavioral),
            "verified" => Ok(GuaranteeLevel::Verified),
            other => Err(format!("unknown guarantee level: {}", other)),
        }
    }
}
