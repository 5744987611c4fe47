//! End-to-end tests over JSON document fixtures.
//!
//! Each test drives one engine the way a host would: load a document, scan
//! or record, mutate the document, and read the results back.

use std::sync::Arc;

use serde_json::json;

use patternsense_core::{
    BehaviorVerifier, ChangeType, CheckPhase, CorrelationEngine, PatternDetector, SnapshotDiffer,
    StructuralHasher, similarity,
};
use patternsense_dom_memory::{MemoryDocument, NodeSpec};
use patternsense_protocols::{
    ActionError, DocumentEnvExt, GuaranteeLevel, InteractionEvent, InteractionKind, Pattern,
};

// ============================================================================
// Fixtures
// ============================================================================

const CHAT: &str = r#"{
  "tag": "body",
  "children": [{
    "tag": "div",
    "attrs": {"class": "chat"},
    "children": [
      {
        "tag": "ul",
        "style": {"overflow_y": "auto"},
        "scroll": {"scroll_top": 0, "scroll_height": 400, "client_height": 100},
        "children": [
          {"tag": "li", "text": "alpha"},
          {"tag": "li", "text": "beta"},
          {"tag": "li", "text": "gamma"}
        ]
      },
      {"tag": "input"}
    ]
  }]
}"#;

const CARDS: &str = r#"{
  "viewport": {"width": 1280, "height": 720},
  "root": {
    "tag": "main",
    "children": [
      {"tag": "section", "attrs": {"id": "left"}, "children": [
        {"tag": "article", "children": [{"tag": "h3", "text": "One"}, {"tag": "p", "text": "a"}]},
        {"tag": "article", "children": [{"tag": "h3", "text": "Two"}, {"tag": "p", "text": "b"}]}
      ]},
      {"tag": "section", "attrs": {"id": "right"}, "children": [
        {"tag": "article", "children": [{"tag": "h3", "text": "Uno"}, {"tag": "p", "text": "c"}]},
        {"tag": "article", "children": [{"tag": "h3", "text": "Dos"}, {"tag": "p", "text": "d"}]}
      ]},
      {"tag": "form", "attrs": {"id": "other"}, "children": [
        {"tag": "input"},
        {"tag": "button", "text": "Go"}
      ]}
    ]
  }
}"#;

const MENU: &str = r#"{
  "tag": "body",
  "children": [
    {"tag": "button", "attrs": {"id": "toggle", "aria-expanded": "false"}, "text": "Menu"},
    {"tag": "ul", "attrs": {"id": "options"}, "style": {"display": "none"}, "children": [
      {"tag": "li", "text": "One"}
    ]}
  ]
}"#;

fn load(json: &str) -> Arc<MemoryDocument> {
    Arc::new(MemoryDocument::from_json(json).unwrap())
}

// ============================================================================
// Detection and verification
// ============================================================================

#[test]
fn test_structural_only_chat_passes_behavioral_not_verified() {
    let doc = load(CHAT);
    let mut detector = PatternDetector::new(doc.clone());

    let results = detector.detect(Pattern::Chat, GuaranteeLevel::Behavioral);
    assert_eq!(results.len(), 1);
    assert!((results[0].confidence - 0.55).abs() < 1e-9);
    assert!(detector.detect(Pattern::Chat, GuaranteeLevel::Verified).is_empty());
}

#[test]
fn test_detect_results_non_increasing() {
    let doc = load(CARDS);
    let mut detector = PatternDetector::new(doc);
    for pattern in Pattern::ALL {
        let results = detector.detect(pattern, GuaranteeLevel::Structural);
        for pair in results.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence, "{}", pattern);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_detected_chat_verifies_after_send() {
    let doc = load(CHAT);
    let mut detector = PatternDetector::new(doc.clone());
    let chat = detector
        .detect(Pattern::Chat, GuaranteeLevel::Behavioral)
        .into_iter()
        .next()
        .unwrap();

    let input = chat.components.input.unwrap();
    let list = chat.components.container.unwrap();
    assert_eq!(doc.tag(list), "ul");
    doc.set_value(input, "hello").unwrap();

    let mut verifier = BehaviorVerifier::new(doc.clone(), &chat);
    assert_eq!(verifier.guarantee(), GuaranteeLevel::Behavioral);

    let target = doc.clone();
    let outcome = verifier
        .verify("send", || async move {
            target
                .set_value(input, "")
                .map_err(|e| ActionError::Failed(e.to_string()))?;
            target
                .append_child(list, &NodeSpec::new("li").text("hello"))
                .map_err(|e| ActionError::Failed(e.to_string()))?;
            Ok(())
        })
        .await;

    assert!(outcome.passed, "{:?}", outcome.results);
    assert_eq!(outcome.guarantee, GuaranteeLevel::Verified);
}

#[tokio::test(start_paused = true)]
async fn test_throwing_action_leaves_guarantee() {
    let doc = load(CHAT);
    let mut detector = PatternDetector::new(doc.clone());
    let chat = detector
        .detect(Pattern::Chat, GuaranteeLevel::Structural)
        .into_iter()
        .next()
        .unwrap();
    let before = chat.guarantee;

    let mut verifier = BehaviorVerifier::new(doc, &chat);
    let outcome = verifier
        .verify("send", || async { Err(ActionError::TargetNotFound("send button".to_string())) })
        .await;

    assert!(!outcome.passed);
    assert!(outcome.results.iter().any(|r| r.phase == CheckPhase::Execution && !r.passed));
    assert_eq!(outcome.guarantee, before);
    assert_eq!(verifier.guarantee(), before);
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn test_identical_snapshots_diff_empty() {
    let doc = load(CARDS);
    let differ = SnapshotDiffer::new(doc);
    let a = differ.capture_at(1);
    let b = differ.capture_at(2);
    let diff = differ.diff(&a, &b);
    assert!(diff.changed.is_empty());
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
}

#[test]
fn test_text_growth_is_classified() {
    let doc = load(r#"{"tag": "div", "children": [{"tag": "span", "text": "Hi"}]}"#);
    let differ = SnapshotDiffer::new(doc.clone());
    let before = differ.capture_at(1);

    let span = doc.resolve_path("DIV[0]>SPAN[0]").unwrap();
    doc.set_text(span, "Hi there").unwrap();
    let after = differ.capture_at(2);

    let diff = differ.diff(&before, &after);
    let entry = diff.entry("DIV[0]>SPAN[0]").unwrap();
    let change = entry.changes.iter().find(|c| c.key == "text_length").unwrap();
    assert_eq!(change.change_type, ChangeType::TextGrew);
    assert_eq!(change.before, json!(2));
    assert_eq!(change.after, json!(8));
}

// ============================================================================
// Structural similarity
// ============================================================================

#[test]
fn test_identical_structures_share_fingerprint() {
    let doc = load(CARDS);
    let hasher = StructuralHasher::default();
    let left = doc.find_by_id("left").unwrap();
    let right = doc.find_by_id("right").unwrap();
    let other = doc.find_by_id("other").unwrap();

    let a = hasher.signature(&*doc, left);
    let b = hasher.signature(&*doc, right);
    let c = hasher.signature(&*doc, other);
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(similarity(&a, &b), 1.0);
    assert_eq!(similarity(&a, &c), similarity(&c, &a));
    assert!(similarity(&a, &c) < 1.0);
}

#[test]
fn test_indexed_section_found_again() {
    let doc = load(CARDS);
    let mut hasher = StructuralHasher::default();
    let left = doc.find_by_id("left").unwrap();
    let right = doc.find_by_id("right").unwrap();

    let signature = hasher.signature(&*doc, left);
    hasher.add_to_index("cards", signature, json!({"source": "left"}));

    let query = hasher.signature(&*doc, right);
    let hits = hasher.query_similar(&query, 0.5, 5);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].key, "cards");
    assert_eq!(hits[0].similarity, 1.0);
    assert_eq!(hits[0].metadata["source"], "left");
}

// ============================================================================
// Correlation
// ============================================================================

#[test]
fn test_stale_action_never_correlated() {
    let doc = load(MENU);
    let engine = CorrelationEngine::new(doc.clone());
    let window = engine.config().window_ms as i64;
    let toggle = doc.find_by_id("toggle").unwrap();

    engine.record_action(InteractionEvent::new(InteractionKind::Click, toggle, 0));
    doc.set_attribute(toggle, "aria-expanded", Some("true")).unwrap();
    engine.record_mutations(&doc.drain_mutations_at(50).unwrap());

    assert!(engine.correlate_at(window + 1).is_empty());
    assert!(engine.get_inferred().is_empty());

    // A fresh click on the same trigger still correlates.
    let t = window + 1000;
    engine.record_action(InteractionEvent::new(InteractionKind::Click, toggle, t));
    doc.set_attribute(toggle, "aria-expanded", Some("false")).unwrap();
    engine.record_mutations(&doc.drain_mutations_at(t + 50).unwrap());

    let inferred = engine.correlate_at(t + 100);
    assert_eq!(inferred.len(), 1);
    assert_eq!(inferred[0].pattern, Pattern::Dropdown);
    assert_eq!(inferred[0].container_id, "toggle");
}
