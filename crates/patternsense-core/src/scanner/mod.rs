//! Candidate scanning and four-signal confidence aggregation.
//!
//! For each pattern, candidates come from the pattern's selectors (and
//! optionally from any node with repeated children). Each candidate gets a
//! structural score from weighted rules, a phrasal score from the lexicons,
//! a binary semantic score from accessibility signals and a behavioral score
//! from the components found inside it. The weighted sum is the confidence.

mod components;
mod rules;
mod semantic;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use patternsense_config::{Config, ConfigError, DetectionConfig};
use patternsense_protocols::{
    DetectionResult, DocumentEnv, DocumentEnvExt, Evidence, GuaranteeLevel, NodeId, Pattern,
    PatternSpec, Selector, SignatureSummary,
};

use crate::lsh::{SimilarEntry, StructuralHasher};
use crate::phrasal::PhrasalScorer;

use rules::{Subtree, has_repeated_children};

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;

/// A pattern spec with its selectors parsed. Invalid selectors are dropped.
#[derive(Debug, Clone)]
struct CompiledSpec {
    spec: PatternSpec,
    selectors: Vec<Selector>,
}

impl CompiledSpec {
    fn compile(pattern: Pattern, spec: PatternSpec) -> Self {
        let selectors = spec
            .selectors
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(sel) => Some(sel),
                Err(e) => {
                    warn!(pattern = %pattern, selector = %s, error = %e, "Skipping invalid selector");
                    None
                }
            })
            .collect();
        Self { spec, selectors }
    }
}

/// Scans a document for UI patterns.
pub struct PatternDetector {
    env: Arc<dyn DocumentEnv>,
    config: DetectionConfig,
    specs: BTreeMap<Pattern, CompiledSpec>,
    phrasal: PhrasalScorer,
    hasher: StructuralHasher,
    registry: HashMap<String, DetectionResult>,
}

impl PatternDetector {
    /// Detector with built-in specs and default weights.
    pub fn new(env: Arc<dyn DocumentEnv>) -> Self {
        let config = DetectionConfig::default();
        let specs = Pattern::ALL
            .iter()
            .map(|p| (*p, CompiledSpec::compile(*p, PatternSpec::builtin(*p))))
            .collect();
        Self {
            env,
            phrasal: PhrasalScorer::new(config.max_corpus_chars),
            config,
            specs,
            hasher: StructuralHasher::default(),
            registry: HashMap::new(),
        }
    }

    /// Detector using the detection, LSH and pattern sections of `config`.
    pub fn from_config(env: Arc<dyn DocumentEnv>, config: &Config) -> Result<Self, ConfigError> {
        let hasher =
            StructuralHasher::new(config.lsh.clone()).map_err(|e| ConfigError::InvalidValue {
                field: "lsh".to_string(),
                message: e.to_string(),
            })?;
        let specs = config
            .pattern_specs()?
            .into_iter()
            .map(|(p, spec)| (p, CompiledSpec::compile(p, spec)))
            .collect();
        Ok(Self {
            env,
            phrasal: PhrasalScorer::new(config.detection.max_corpus_chars),
            config: config.detection.clone(),
            specs,
            hasher,
            registry: HashMap::new(),
        })
    }

    /// Replace the spec for one pattern.
    pub fn with_spec(mut self, pattern: Pattern, spec: PatternSpec) -> Self {
        self.specs.insert(pattern, CompiledSpec::compile(pattern, spec));
        self
    }

    pub fn spec(&self, pattern: Pattern) -> Option<&PatternSpec> {
        self.specs.get(&pattern).map(|c| &c.spec)
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Candidate nodes for `pattern`, deduplicated by structural path, in
    /// discovery order.
    pub fn candidates(&self, pattern: Pattern) -> Vec<NodeId> {
        let Some(compiled) = self.specs.get(&pattern) else {
            return Vec::new();
        };
        let env = self.env.as_ref();
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        let mut push = |node: NodeId| {
            if let Some(path) = env.structural_path(node) {
                if seen.insert(path) {
                    out.push(node);
                }
            }
        };

        for selector in &compiled.selectors {
            for node in env.query_all(selector) {
                push(node);
            }
        }
        if compiled.spec.scan_repeated_children {
            for node in env.all_nodes() {
                if has_repeated_children(env, node) {
                    push(node);
                }
            }
        }
        out
    }

    /// Held rule weight over total rule weight.
    pub fn structural_score(&self, node: NodeId, pattern: Pattern) -> f64 {
        let Some(compiled) = self.specs.get(&pattern) else {
            return 0.0;
        };
        let total = compiled.spec.total_weight();
        if total <= 0.0 {
            return 0.0;
        }
        let tree = Subtree::new(self.env.as_ref(), node);
        let held: f64 = compiled
            .spec
            .rules
            .iter()
            .filter(|(rule, _)| tree.holds(**rule))
            .map(|(_, w)| *w)
            .sum();
        held / total
    }

    /// Scan for `pattern`, returning candidates whose confidence reaches the
    /// threshold of `guarantee`, best first. Results are also registered by
    /// path.
    pub fn detect(&mut self, pattern: Pattern, guarantee: GuaranteeLevel) -> Vec<DetectionResult> {
        let threshold = self.config.thresholds.threshold(guarantee);

        let mut scored: Vec<(NodeId, f64)> = self
            .candidates(pattern)
            .into_iter()
            .map(|n| (n, self.structural_score(n, pattern)))
            .filter(|(_, s)| *s > self.config.min_structural_score)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.config.max_candidates);

        let mut results: Vec<DetectionResult> = scored
            .into_iter()
            .filter_map(|(node, structural)| self.evaluate(node, pattern, structural))
            .filter(|r| r.confidence >= threshold)
            .collect();
        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        for result in &results {
            self.registry.insert(result.path.clone(), result.clone());
        }
        info!(
            pattern = %pattern,
            guarantee = %guarantee,
            found = results.len(),
            "Detection complete"
        );
        results
    }

    /// Run [`detect`](Self::detect) for every known pattern.
    pub fn detect_all(&mut self, guarantee: GuaranteeLevel) -> Vec<DetectionResult> {
        let mut all: Vec<DetectionResult> = Pattern::ALL
            .iter()
            .flat_map(|p| self.detect(*p, guarantee))
            .collect();
        all.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        all
    }

    /// Detect by pattern name. Unknown names yield nothing.
    pub fn detect_named(&mut self, name: &str, guarantee: GuaranteeLevel) -> Vec<DetectionResult> {
        match name.parse::<Pattern>() {
            Ok(pattern) => self.detect(pattern, guarantee),
            Err(e) => {
                warn!(name = %name, error = %e, "Unknown pattern");
                Vec::new()
            }
        }
    }

    fn evaluate(&self, node: NodeId, pattern: Pattern, structural: f64) -> Option<DetectionResult> {
        let env = self.env.as_ref();
        let path = env.structural_path(node)?;
        let tree = Subtree::new(env, node);

        let phrasal = self.phrasal.score(env, node, pattern);
        let semantic = semantic::semantic_score(&tree, pattern);
        let (components, behavioral) = components::discover(&tree, pattern);

        let w = &self.config.weights;
        let confidence = (structural * w.structural
            + phrasal.score * w.phrasal
            + semantic * w.semantic
            + behavioral * w.behavioral)
            .clamp(0.0, 1.0);

        debug!(
            pattern = %pattern,
            path = %path,
            structural,
            phrasal = phrasal.score,
            semantic,
            behavioral,
            confidence,
            "Scored candidate"
        );

        let signature = self.hasher.signature(env, node);
        Some(DetectionResult {
            path,
            node,
            pattern,
            confidence,
            guarantee: self
                .config
                .thresholds
                .level_for(confidence)
                .unwrap_or(GuaranteeLevel::Structural),
            evidence: Evidence {
                structural,
                phrasal: phrasal.score,
                phrasal_matches: phrasal.matches,
                semantic,
                behavioral,
            },
            components,
            signature: SignatureSummary {
                fingerprint: signature.fingerprint,
                features: signature.features,
            },
        })
    }

    /// Previously registered detection at `path`.
    pub fn registered(&self, path: &str) -> Option<&DetectionResult> {
        self.registry.get(path)
    }

    pub fn registry(&self) -> &HashMap<String, DetectionResult> {
        &self.registry
    }

    pub fn clear_registry(&mut self) {
        self.registry.clear();
    }

    /// Re-resolve a registered detection's path against the current tree,
    /// updating its node handle. `None` when unregistered or unresolvable.
    pub fn rebind(&mut self, path: &str) -> Option<DetectionResult> {
        let node = self.env.resolve_path(path)?;
        let entry = self.registry.get_mut(path)?;
        entry.node = node;
        Some(entry.clone())
    }

    pub fn hasher(&self) -> &StructuralHasher {
        &self.hasher
    }

    pub fn hasher_mut(&mut self) -> &mut StructuralHasher {
        &mut self.hasher
    }

    /// Add a detection's signature to the similarity index under
    /// `pattern:path`.
    pub fn index_detection(&mut self, result: &DetectionResult) {
        let signature = self
            .hasher
            .signature_from_features(result.signature.features.clone());
        let key = format!("{}:{}", result.pattern, result.path);
        let metadata = json!({
            "pattern": result.pattern,
            "path": result.path,
            "confidence": result.confidence,
        });
        self.hasher.add_to_index(key, signature, metadata);
    }

    /// Indexed entries structurally similar to `node`.
    pub fn find_similar(&self, node: NodeId, min_similarity: f64, limit: usize) -> Vec<SimilarEntry> {
        let signature = self.hasher.signature(self.env.as_ref(), node);
        self.hasher.query_similar(&signature, min_similarity, limit)
    }
}
