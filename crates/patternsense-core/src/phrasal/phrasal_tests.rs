use super::*;
use patternsense_dom_memory::{MemoryDocument, NodeSpec};

fn surface(text: &str, labels: &str, buttons: &str) -> TextSurface {
    TextSurface {
        text: text.to_string(),
        labels: labels.to_string(),
        buttons: buttons.to_string(),
    }
}

#[test]
fn test_empty_surface_scores_zero() {
    let scorer = PhrasalScorer::default();
    for pattern in Pattern::ALL {
        let score = scorer.score_surface(&TextSurface::default(), pattern);
        assert_eq!(score.score, 0.0);
        assert!(score.matches.is_empty());
    }
}

#[test]
fn test_strong_phrase() {
    let scorer = PhrasalScorer::default();
    let score = scorer.score_surface(&surface("we use cookies here", "", ""), Pattern::CookieBanner);
    assert!(score
        .matches
        .iter()
        .any(|m| m.kind == PhraseKind::Strong && m.phrase == "we use cookies"));
    assert!(score.score >= 0.35);
}

#[test]
fn test_placeholder_only_matches_labels() {
    let scorer = PhrasalScorer::default();
    let in_text = scorer.score_surface(&surface("ask anything", "", ""), Pattern::Chat);
    assert!(!in_text.matches.iter().any(|m| m.kind == PhraseKind::Placeholder));

    let in_labels = scorer.score_surface(&surface("", "ask anything", ""), Pattern::Chat);
    assert!(in_labels.matches.iter().any(|m| m.kind == PhraseKind::Placeholder));
}

#[test]
fn test_button_only_matches_buttons() {
    let scorer = PhrasalScorer::default();
    let score = scorer.score_surface(&surface("send", "", ""), Pattern::Chat);
    assert!(!score.matches.iter().any(|m| m.kind == PhraseKind::Button));

    let score = scorer.score_surface(&surface("", "", "send"), Pattern::Chat);
    let buttons: Vec<_> = score.matches.iter().filter(|m| m.kind == PhraseKind::Button).collect();
    assert_eq!(buttons.len(), 1);
    assert_eq!(buttons[0].phrase, "send");
}

#[test]
fn test_negative_lowers_and_clamps() {
    let scorer = PhrasalScorer::default();
    let score = scorer.score_surface(&surface("enter password", "", ""), Pattern::Chat);
    assert_eq!(score.score, 0.0);
    assert!(score.matches.iter().any(|m| m.kind == PhraseKind::Negative));
}

#[test]
fn test_score_clamped_to_one() {
    let scorer = PhrasalScorer::default();
    let score = scorer.score_surface(
        &surface("sign in log in forgot password remember me", "password username", "sign in"),
        Pattern::Login,
    );
    assert_eq!(score.score, 1.0);
}

#[test]
fn test_extract_surface_from_document() {
    let root = NodeSpec::new("form")
        .child(NodeSpec::new("label").attr("for", "user").text("Username"))
        .child(NodeSpec::new("input").attr("id", "user").attr("placeholder", "Your EMAIL"))
        .child(NodeSpec::new("input").attr("type", "password").attr("aria-label", "Password"))
        .child(NodeSpec::new("button").text("Sign In"));
    let doc = MemoryDocument::from_node(&root);
    let form = doc.root().unwrap();

    let surface = TextSurface::extract(&doc, form, DEFAULT_MAX_CORPUS_CHARS);
    assert!(surface.text.contains("username"));
    assert!(surface.labels.contains("your email"));
    assert!(surface.labels.contains("password"));
    assert!(surface.labels.contains("username"));
    assert_eq!(surface.buttons, "sign in");

    let score = PhrasalScorer::default().score(&doc, form, Pattern::Login);
    assert!(score.score > 0.5);
    assert!(score.matches.iter().any(|m| m.kind == PhraseKind::Button && m.phrase == "sign in"));
}

#[test]
fn test_corpus_capped() {
    let root = NodeSpec::new("div").text("a".repeat(100));
    let doc = MemoryDocument::from_node(&root);
    let surface = TextSurface::extract(&doc, doc.root().unwrap(), 10);
    assert_eq!(surface.text.len(), 10);
}

#[test]
fn test_each_phrase_counted_once() {
    let scorer = PhrasalScorer::default();
    let score = scorer.score_surface(&surface("search search search", "", ""), Pattern::Search);
    let searches = score.matches.iter().filter(|m| m.phrase == "search").count();
    assert_eq!(searches, 1);
}
