use super::*;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use patternsense_dom_memory::{MemoryDocument, NodeSpec};
use patternsense_protocols::{
    ComputedStyle, InteractionKind, NodeId, Pattern, Rect, ScrollMetrics,
};

fn page() -> Arc<MemoryDocument> {
    let body = NodeSpec::new("body")
        .child(
            NodeSpec::new("div")
                .attr("class", "menu")
                .child(
                    NodeSpec::new("button")
                        .attr("id", "toggle")
                        .attr("aria-expanded", "false")
                        .child(NodeSpec::new("span").attr("id", "caret").text("v")),
                ),
        )
        .child(NodeSpec::new("button").attr("id", "open-dialog").text("Open"))
        .child(NodeSpec::new("ul").attr("id", "log").child(NodeSpec::new("li").text("hi")))
        .child(NodeSpec::new("input").attr("id", "composer"))
        .child(
            NodeSpec::new("div")
                .attr("id", "scroller")
                .style(ComputedStyle {
                    overflow_y: "auto".to_string(),
                    ..Default::default()
                })
                .scroll(ScrollMetrics {
                    scroll_top: 300.0,
                    scroll_height: 400.0,
                    client_height: 100.0,
                })
                .child(NodeSpec::new("article").text("one")),
        );
    Arc::new(MemoryDocument::from_node(&body))
}

fn id(doc: &MemoryDocument, id: &str) -> NodeId {
    doc.find_by_id(id).unwrap()
}

fn flush(doc: &MemoryDocument, engine: &CorrelationEngine, at: i64) {
    if let Some(batch) = doc.drain_mutations_at(at) {
        engine.record_mutations(&batch);
    }
}

fn click(target: NodeId, at: i64) -> InteractionEvent {
    InteractionEvent::new(InteractionKind::Click, target, at)
}

fn enter(target: NodeId, at: i64) -> InteractionEvent {
    InteractionEvent::new(
        InteractionKind::KeyPress {
            key: "Enter".to_string(),
        },
        target,
        at,
    )
}

#[test]
fn test_dropdown_from_nested_click() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let toggle = id(&doc, "toggle");

    engine.record_action(click(id(&doc, "caret"), 0));
    doc.set_attribute(toggle, "aria-expanded", Some("true")).unwrap();
    flush(&doc, &engine, 80);

    let found = engine.correlate_at(200);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].pattern, Pattern::Dropdown);
    assert_eq!(found[0].confidence, 0.9);
    assert_eq!(found[0].container, toggle);
    assert_eq!(found[0].container_tag, "button");
    assert_eq!(found[0].container_id, "toggle");
    assert_eq!(found[0].extra_parts.trigger, Some(toggle));
}

#[test]
fn test_modal_from_dialog_appearance() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let body = doc.root().unwrap();

    engine.record_action(click(id(&doc, "open-dialog"), 1000));
    doc.append_child(
        body,
        &NodeSpec::new("div")
            .attr("class", "backdrop")
            .child(NodeSpec::new("section").attr("role", "dialog").attr("id", "confirm")),
    )
    .unwrap();
    flush(&doc, &engine, 1050);

    let found = engine.correlate_at(1100);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].pattern, Pattern::Modal);
    assert_eq!(found[0].confidence, 0.95);
    assert_eq!(found[0].container_tag, "section");
    assert_eq!(found[0].container_id, "confirm");
}

#[test]
fn test_modal_from_large_overlay() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let body = doc.root().unwrap();

    engine.record_action(click(id(&doc, "open-dialog"), 0));
    doc.append_child(
        body,
        &NodeSpec::new("div")
            .style(ComputedStyle {
                position: "fixed".to_string(),
                ..Default::default()
            })
            .rect(Rect::new(0.0, 0.0, 1280.0, 720.0)),
    )
    .unwrap();
    flush(&doc, &engine, 10);

    let found = engine.correlate_at(20);
    assert_eq!(found[0].pattern, Pattern::Modal);
    assert_eq!(found[0].confidence, 0.75);
}

#[test]
fn test_small_inline_appearance_is_not_modal() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let body = doc.root().unwrap();

    engine.record_action(click(id(&doc, "open-dialog"), 0));
    doc.append_child(body, &NodeSpec::new("p").text("toast")).unwrap();
    flush(&doc, &engine, 10);

    assert!(engine.correlate_at(20).is_empty());
}

#[test]
fn test_chat_from_enter() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let log = id(&doc, "log");
    let composer = id(&doc, "composer");

    engine.record_action(enter(composer, 0));
    doc.append_child(log, &NodeSpec::new("li").text("sent")).unwrap();
    flush(&doc, &engine, 300);

    let found = engine.correlate_at(400);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].pattern, Pattern::Chat);
    assert_eq!(found[0].confidence, 0.85);
    assert_eq!(found[0].container, log);
    assert_eq!(found[0].extra_parts.input, Some(composer));
}

#[test]
fn test_feed_from_scroll_at_bottom() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let scroller = id(&doc, "scroller");

    engine.record_action(InteractionEvent::new(InteractionKind::Scroll, scroller, 0));
    doc.append_child(scroller, &NodeSpec::new("article").text("two")).unwrap();
    flush(&doc, &engine, 500);

    let found = engine.correlate_at(600);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].pattern, Pattern::Feed);
    assert_eq!(found[0].confidence, 0.7);
    assert_eq!(found[0].container_id, "scroller");
}

#[test]
fn test_scroll_away_from_bottom_not_feed() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let scroller = id(&doc, "scroller");
    doc.set_scroll(
        scroller,
        ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 400.0,
            client_height: 100.0,
        },
    )
    .unwrap();

    engine.record_action(InteractionEvent::new(InteractionKind::Scroll, scroller, 0));
    doc.append_child(scroller, &NodeSpec::new("article")).unwrap();
    flush(&doc, &engine, 100);

    assert!(engine.correlate_at(200).is_empty());
}

#[test]
fn test_action_older_than_window_never_correlated() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let log = id(&doc, "log");

    engine.record_action(enter(id(&doc, "composer"), 0));
    doc.append_child(log, &NodeSpec::new("li")).unwrap();
    flush(&doc, &engine, 100);

    assert!(engine.correlate_at(1500).is_empty());
    assert!(engine.correlate_at(1800).is_empty());
    assert!(engine.get_inferred().is_empty());
}

#[test]
fn test_mutation_outside_window_ignored() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let log = id(&doc, "log");

    engine.record_action(enter(id(&doc, "composer"), 1000));
    doc.append_child(log, &NodeSpec::new("li")).unwrap();
    flush(&doc, &engine, 900);

    assert!(engine.correlate_at(1100).is_empty());
}

#[test]
fn test_action_correlates_once_first_rule_wins() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let toggle = id(&doc, "toggle");
    let body = doc.root().unwrap();

    engine.record_action(click(toggle, 0));
    doc.set_attribute(toggle, "aria-expanded", Some("true")).unwrap();
    doc.append_child(body, &NodeSpec::new("div").attr("role", "dialog")).unwrap();
    flush(&doc, &engine, 50);

    let found = engine.correlate_at(100);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].pattern, Pattern::Dropdown);
    assert!(engine.correlate_at(200).is_empty());
}

#[test]
fn test_dedup_keeps_higher_confidence() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    let log = id(&doc, "log");
    let composer = id(&doc, "composer");

    engine.record_action(enter(composer, 0));
    doc.append_child(log, &NodeSpec::new("li")).unwrap();
    flush(&doc, &engine, 10);
    assert_eq!(engine.correlate_at(20).len(), 1);

    engine.record_action(enter(composer, 100));
    doc.append_child(log, &NodeSpec::new("li")).unwrap();
    flush(&doc, &engine, 110);
    let again = engine.correlate_at(120);
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].inferred_at_ms, 120);

    let inferred = engine.get_inferred();
    assert_eq!(inferred.len(), 1);
    assert_eq!(inferred[0].inferred_at_ms, 120);
}

#[test]
fn test_min_confidence_filters() {
    let doc = page();
    let config = CorrelationConfig {
        min_confidence: 0.8,
        ..Default::default()
    };
    let engine = CorrelationEngine::with_config(doc.clone(), config);
    let scroller = id(&doc, "scroller");

    engine.record_action(InteractionEvent::new(InteractionKind::Scroll, scroller, 0));
    doc.append_child(scroller, &NodeSpec::new("article")).unwrap();
    flush(&doc, &engine, 10);

    assert!(engine.correlate_at(20).is_empty());
    assert!(engine.get_inferred().is_empty());
}

#[test]
fn test_other_keys_ignored() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    engine.record_action(InteractionEvent::new(
        InteractionKind::KeyPress {
            key: "a".to_string(),
        },
        id(&doc, "composer"),
        0,
    ));
    assert_eq!(engine.queue_sizes(), (0, 0));
}

#[test]
fn test_queues_bounded() {
    let doc = page();
    let config = CorrelationConfig {
        max_queue: 5,
        ..Default::default()
    };
    let engine = CorrelationEngine::with_config(doc.clone(), config);
    let composer = id(&doc, "composer");
    for t in 0..20 {
        engine.record_action(InteractionEvent::new(InteractionKind::Input, composer, t));
    }
    let batch = MutationBatch {
        timestamp_ms: 0,
        records: (0..20)
            .map(|_| patternsense_protocols::MutationRecord {
                target: composer,
                kind: patternsense_protocols::MutationKind::Attribute {
                    name: "value".to_string(),
                    old_value: None,
                },
            })
            .collect(),
    };
    engine.record_mutations(&batch);
    assert_eq!(engine.queue_sizes(), (5, 5));
}

#[test]
fn test_stale_entries_pruned() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    engine.record_action(click(id(&doc, "open-dialog"), 0));
    doc.set_attribute(id(&doc, "toggle"), "aria-expanded", Some("true")).unwrap();
    flush(&doc, &engine, 0);
    assert_eq!(engine.queue_sizes(), (1, 1));

    engine.correlate_at(2001);
    assert_eq!(engine.queue_sizes(), (0, 0));
}

#[test]
fn test_clear() {
    let doc = page();
    let engine = CorrelationEngine::new(doc.clone());
    engine.record_action(enter(id(&doc, "composer"), 0));
    doc.append_child(id(&doc, "log"), &NodeSpec::new("li")).unwrap();
    flush(&doc, &engine, 5);
    engine.correlate_at(10);
    assert_eq!(engine.get_inferred().len(), 1);

    engine.clear();
    assert_eq!(engine.queue_sizes(), (0, 0));
    assert!(engine.get_inferred().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tick_broadcasts_inferences() {
    let doc = page();
    let now = Arc::new(AtomicI64::new(0));
    let clock_now = now.clone();
    let engine = CorrelationEngine::with_clock(
        doc.clone(),
        CorrelationConfig::default(),
        Arc::new(move || clock_now.load(Ordering::SeqCst)),
    );
    let mut rx = engine.subscribe();

    assert!(engine.start());
    assert!(!engine.start());
    assert!(engine.is_running());

    engine.record_action(enter(id(&doc, "composer"), 0));
    doc.append_child(id(&doc, "log"), &NodeSpec::new("li")).unwrap();
    flush(&doc, &engine, 100);
    now.store(300, Ordering::SeqCst);

    let inferred = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(inferred.pattern, Pattern::Chat);
    assert_eq!(inferred.inferred_at_ms, 300);

    assert!(engine.stop());
    assert!(!engine.stop());
    assert!(!engine.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_stopped_engine_does_not_tick() {
    let doc = page();
    let engine = CorrelationEngine::with_clock(doc.clone(), CorrelationConfig::default(), Arc::new(|| 50));
    assert!(engine.start());
    assert!(engine.stop());

    engine.record_action(enter(id(&doc, "composer"), 0));
    doc.append_child(id(&doc, "log"), &NodeSpec::new("li")).unwrap();
    flush(&doc, &engine, 10);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(engine.get_inferred().is_empty());
    assert_eq!(engine.correlate().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_tick_interval_still_ticks() {
    let doc = page();
    let config = CorrelationConfig {
        tick_interval_ms: 0,
        ..Default::default()
    };
    let engine = CorrelationEngine::with_clock(doc.clone(), config, Arc::new(|| 300));
    let mut rx = engine.subscribe();
    assert!(engine.start());

    engine.record_action(enter(id(&doc, "composer"), 0));
    doc.append_child(id(&doc, "log"), &NodeSpec::new("li")).unwrap();
    flush(&doc, &engine, 100);

    let inferred = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(inferred.pattern, Pattern::Chat);
    assert!(engine.is_running());
    assert!(engine.stop());
}

#[test]
fn test_start_without_runtime() {
    let engine = CorrelationEngine::new(page());
    assert!(!engine.start());
    assert!(!engine.is_running());
}
