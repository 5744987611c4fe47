//! Phrase-lexicon scoring over a candidate's text surface.
//!
//! Matching is plain substring search on a lowercase corpus. Coincidental
//! substrings produce false positives; that is accepted.

mod lexicon;

use serde::{Deserialize, Serialize};

use patternsense_protocols::{
    DocumentEnv, DocumentEnvExt, NodeId, Pattern, PhraseKind, PhraseMatch, Selector,
};

pub use lexicon::{Lexicon, lexicon};

#[cfg(test)]
#[path = "phrasal_tests.rs"]
mod tests;

/// Default cap on collected corpus characters.
pub const DEFAULT_MAX_CORPUS_CHARS: usize = 5000;

/// Lowercased text extracted from a candidate subtree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextSurface {
    /// Visible text of the subtree.
    pub text: String,
    /// Placeholders, accessibility labels and `<label for>` texts.
    pub labels: String,
    pub buttons: String,
}

impl TextSurface {
    /// Collect the surface of `node`, capping each part at `max_chars`.
    pub fn extract(env: &dyn DocumentEnv, node: NodeId, max_chars: usize) -> Self {
        let mut labels: Vec<String> = Vec::new();
        let mut buttons: Vec<String> = Vec::new();
        let mut ids: Vec<String> = Vec::new();

        let text = if env.is_visible(node) { env.text(node) } else { String::new() };

        for n in env.walk(node) {
            for name in ["placeholder", "aria-label", "title"] {
                if let Some(v) = env.attr(n, name) {
                    labels.push(v);
                }
            }
            if env.is_button(n) {
                let label = env.button_text(n);
                if !label.is_empty() {
                    buttons.push(label);
                }
            }
            if env.is_form_control(n) {
                if let Some(id) = env.attr(n, "id") {
                    ids.push(id);
                }
            }
        }

        if !ids.is_empty() {
            if let Ok(selector) = Selector::parse("label[for]") {
                for label in env.query_all(&selector) {
                    let target = env.attr(label, "for").unwrap_or_default();
                    if ids.contains(&target) {
                        labels.push(env.text(label));
                    }
                }
            }
        }

        Self {
            text: normalize(&text, max_chars),
            labels: normalize(&labels.join(" "), max_chars),
            buttons: normalize(&buttons.join(" "), max_chars),
        }
    }

    /// Everything, for general phrase matching.
    pub fn corpus(&self) -> String {
        [self.text.as_str(), self.labels.as_str(), self.buttons.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn normalize(s: &str, max_chars: usize) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase().chars().take(max_chars).collect()
}

/// Score plus the phrases behind it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhrasalScore {
    pub score: f64,
    pub matches: Vec<PhraseMatch>,
}

/// Scores text surfaces against the per-pattern lexicons.
#[derive(Debug, Clone)]
pub struct PhrasalScorer {
    max_chars: usize,
}

impl Default for PhrasalScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CORPUS_CHARS)
    }
}

impl PhrasalScorer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn score(&self, env: &dyn DocumentEnv, node: NodeId, pattern: Pattern) -> PhrasalScore {
        let surface = TextSurface::extract(env, node, self.max_chars);
        self.score_surface(&surface, pattern)
    }

    /// Each phrase counts at most once. Result clamped to `[0, 1]`.
    pub fn score_surface(&self, surface: &TextSurface, pattern: Pattern) -> PhrasalScore {
        let lex = lexicon(pattern);
        let corpus = surface.corpus();
        let mut matches = Vec::new();

        let lists: [(PhraseKind, &[&str], &str); 5] = [
            (PhraseKind::Strong, lex.strong, &corpus),
            (PhraseKind::Medium, lex.medium, &corpus),
            (PhraseKind::Placeholder, lex.placeholder, &surface.labels),
            (PhraseKind::Button, lex.button, &surface.buttons),
            (PhraseKind::Negative, lex.negative, &corpus),
        ];

        let mut score = 0.0;
        for (kind, phrases, haystack) in lists {
            if haystack.is_empty() {
                continue;
            }
            for phrase in phrases {
                if haystack.contains(phrase) {
                    score += kind.weight();
                    matches.push(PhraseMatch {
                        kind,
                        phrase: phrase.to_string(),
                    });
                }
            }
        }

        PhrasalScore {
            score: score.clamp(0.0, 1.0),
            matches,
        }
    }
}
