//! Document scanning subcommands: detect, diff and similar.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use serde_json::json;
use tracing::{info, warn};

use patternsense_config::Config;
use patternsense_core::{PatternDetector, SnapshotDiffer, StructuralHasher};
use patternsense_dom_memory::MemoryDocument;
use patternsense_protocols::{DetectionResult, DocumentEnv, GuaranteeLevel, Pattern};

fn load_document(path: &Path) -> anyhow::Result<Arc<MemoryDocument>> {
    let doc = MemoryDocument::load(path)
        .with_context(|| format!("failed to load document {}", path.display()))?;
    info!(path = %path.display(), nodes = doc.len(), "Loaded document");
    Ok(Arc::new(doc))
}

/// Scan one document and print matches best first.
pub(crate) fn detect(
    config: &Config,
    document: &Path,
    pattern: Option<&str>,
    guarantee: &str,
    json: bool,
) -> anyhow::Result<()> {
    let guarantee: GuaranteeLevel = guarantee.parse().map_err(|e: String| anyhow!(e))?;
    let pattern = pattern
        .map(|name| name.parse::<Pattern>().map_err(|e| anyhow!(e)))
        .transpose()?;

    let doc = load_document(document)?;
    let mut detector =
        PatternDetector::from_config(doc, config).context("invalid detection configuration")?;
    let results = match pattern {
        Some(pattern) => detector.detect(pattern, guarantee),
        None => detector.detect_all(guarantee),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    print_detections(&results);
    Ok(())
}

fn print_detections(results: &[DetectionResult]) {
    if results.is_empty() {
        println!("No patterns found.");
        return;
    }
    println!(
        "{:<14} {:>6} {:<11} {:>6} {:>6} {:>6} {:>6}  {}",
        "PATTERN", "CONF", "GUARANTEE", "STRUCT", "PHRASE", "SEM", "BEHAV", "PATH"
    );
    println!("{}", "-".repeat(100));
    for r in results {
        println!(
            "{:<14} {:>6.3} {:<11} {:>6.2} {:>6.2} {:>6.2} {:>6.2}  {}",
            r.pattern.as_str(),
            r.confidence,
            r.guarantee.to_string(),
            r.evidence.structural,
            r.evidence.phrasal,
            r.evidence.semantic,
            r.evidence.behavioral,
            r.path
        );
        if !r.evidence.phrasal_matches.is_empty() {
            let phrases: Vec<&str> = r
                .evidence
                .phrasal_matches
                .iter()
                .map(|m| m.phrase.as_str())
                .collect();
            println!("{:<14} phrases: {}", "", phrases.join(", "));
        }
    }
}

/// Diff two documents by structural path and run the quick rules.
pub(crate) fn diff(config: &Config, before: &Path, after: &Path, json: bool) -> anyhow::Result<()> {
    let earlier = SnapshotDiffer::with_config(load_document(before)?, config.snapshot.clone()).capture_at(0);
    let differ = SnapshotDiffer::with_config(load_document(after)?, config.snapshot.clone());
    let later = differ.capture_at(1);

    let diff = differ.diff(&earlier, &later);
    let matches = differ.detect_pattern(&diff);

    if json {
        let out = json!({ "diff": diff, "patterns": matches });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let s = &diff.summary;
    println!(
        "changed: {}  added: {}  removed: {}  increased: {}  decreased: {}",
        s.changed, s.added, s.removed, s.increased, s.decreased
    );
    for entry in &diff.changed {
        println!("~ {}", entry.path);
        for change in &entry.changes {
            println!(
                "    {:<16} {} -> {}  ({})",
                change.key, change.before, change.after, change.change_type
            );
        }
    }
    for path in &diff.added {
        println!("+ {}", path);
    }
    for path in &diff.removed {
        println!("- {}", path);
    }
    if !matches.is_empty() {
        println!();
        for m in &matches {
            println!("{:<10} {:.2}  {}", m.pattern.as_str(), m.confidence, m.evidence);
        }
    }
    Ok(())
}

/// Index every candidate's root subtree and query with the query's root.
pub(crate) fn similar(
    config: &Config,
    query: &Path,
    candidates: &[PathBuf],
    min: f64,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let mut hasher = StructuralHasher::new(config.lsh.clone()).context("invalid lsh configuration")?;

    for path in candidates {
        let doc = load_document(path)?;
        let Some(root) = doc.root() else {
            warn!(path = %path.display(), "Skipping empty document");
            continue;
        };
        let signature = hasher.signature(&*doc, root);
        let key = path.display().to_string();
        hasher.add_to_index(key.clone(), signature, json!({ "file": key }));
    }

    let doc = load_document(query)?;
    let root = doc
        .root()
        .with_context(|| format!("{} has no root element", query.display()))?;
    let signature = hasher.signature(&*doc, root);
    let hits = hasher.query_similar(&signature, min, limit);
    info!(indexed = hasher.len(), hits = hits.len(), "Similarity query finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("No similar documents.");
        return Ok(());
    }
    for hit in hits {
        println!("{:.3}  {}", hit.similarity, hit.key);
    }
    Ok(())
}
