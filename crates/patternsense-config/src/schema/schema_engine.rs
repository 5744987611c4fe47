//! Engine configuration types (detection, LSH, correlation, snapshot, verifier).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use patternsense_protocols::GuaranteeLevel;

/// Candidate scanning and confidence aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default)]
    pub weights: SignalWeights,

    #[serde(default)]
    pub thresholds: GuaranteeThresholds,

    /// Candidates kept per pattern after structural scoring.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Candidates scoring at or below this are discarded.
    #[serde(default = "default_min_structural_score")]
    pub min_structural_score: f64,

    /// Cap on the text corpus collected for phrasal scoring.
    #[serde(default = "default_max_corpus_chars")]
    pub max_corpus_chars: usize,
}

fn default_max_candidates() -> usize {
    10
}

fn default_min_structural_score() -> f64 {
    0.2
}

fn default_max_corpus_chars() -> usize {
    5000
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            thresholds: GuaranteeThresholds::default(),
            max_candidates: default_max_candidates(),
            min_structural_score: default_min_structural_score(),
            max_corpus_chars: default_max_corpus_chars(),
        }
    }
}

/// Weights of the four signals in the confidence sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub structural: f64,
    pub phrasal: f64,
    pub semantic: f64,
    pub behavioral: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            structural: 0.25,
            phrasal: 0.30,
            semantic: 0.15,
            behavioral: 0.30,
        }
    }
}

impl SignalWeights {
    pub fn sum(&self) -> f64 {
        self.structural + self.phrasal + self.semantic + self.behavioral
    }
}

/// Minimum confidence per guarantee level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuaranteeThresholds {
    pub structural: f64,
    pub semantic: f64,
    pub behavioral: f64,
    pub verified: f64,
}

impl Default for GuaranteeThresholds {
    fn default() -> Self {
        Self {
            structural: GuaranteeLevel::Structural.default_threshold(),
            semantic: GuaranteeLevel::Semantic.default_threshold(),
            behavioral: GuaranteeLevel::Behavioral.default_threshold(),
            verified: GuaranteeLevel::Verified.default_threshold(),
        }
    }
}

impl GuaranteeThresholds {
    pub fn threshold(&self, level: GuaranteeLevel) -> f64 {
        match level {
            GuaranteeLevel::Structural => self.structural,
            GuaranteeLevel::Semantic => self.semantic,
            GuaranteeLevel::Behavioral => self.behavioral,
            GuaranteeLevel::Verified => self.verified,
        }
    }

    /// Highest level whose threshold `confidence` reaches.
    pub fn level_for(&self, confidence: f64) -> Option<GuaranteeLevel> {
        GuaranteeLevel::ALL
            .iter()
            .rev()
            .copied()
            .find(|level| confidence >= self.threshold(*level))
    }
}

/// Structural hashing and the LSH index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LshConfig {
    /// MinHash vector length.
    #[serde(default = "default_num_hashes")]
    pub num_hashes: usize,

    /// Must divide `num_hashes`.
    #[serde(default = "default_num_bands")]
    pub num_bands: usize,

    /// Feature extraction depth limit.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_shingle_size")]
    pub shingle_size: usize,
}

fn default_num_hashes() -> usize {
    64
}

fn default_num_bands() -> usize {
    16
}

fn default_max_depth() -> usize {
    6
}

fn default_shingle_size() -> usize {
    3
}

impl Default for LshConfig {
    fn default() -> Self {
        Self {
            num_hashes: default_num_hashes(),
            num_bands: default_num_bands(),
            max_depth: default_max_depth(),
            shingle_size: default_shingle_size(),
        }
    }
}

/// Passive action/mutation correlation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Capacity of each of the action and mutation queues.
    #[serde(default = "default_max_queue")]
    pub max_queue: usize,

    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Distance from the bottom edge that still counts as "at bottom".
    #[serde(default = "default_bottom_threshold_px")]
    pub bottom_threshold_px: f64,

    /// Fraction of the viewport a fixed node must cover to count as an overlay.
    #[serde(default = "default_overlay_ratio")]
    pub overlay_viewport_ratio: f64,
}

fn default_window_ms() -> u64 {
    1000
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_max_queue() -> usize {
    100
}

fn default_min_confidence() -> f64 {
    0.6
}

fn default_bottom_threshold_px() -> f64 {
    10.0
}

fn default_overlay_ratio() -> f64 {
    0.2
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            max_queue: default_max_queue(),
            min_confidence: default_min_confidence(),
            bottom_threshold_px: default_bottom_threshold_px(),
            overlay_viewport_ratio: default_overlay_ratio(),
        }
    }
}

impl CorrelationConfig {
    /// Tick period, never shorter than 1ms.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Snapshot capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_max_retained")]
    pub max_retained: usize,

    /// Longest `text` stored per record; `text_length` keeps the full length.
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
}

fn default_max_retained() -> usize {
    10
}

fn default_max_text_len() -> usize {
    200
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            max_retained: default_max_retained(),
            max_text_len: default_max_text_len(),
        }
    }
}

/// Behavioral verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Postcondition polling cadence.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Multiplier applied to every postcondition timeout.
    #[serde(default = "default_timeout_scale")]
    pub timeout_scale: f64,
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_timeout_scale() -> f64 {
    1.0
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            timeout_scale: default_timeout_scale(),
        }
    }
}

impl VerifierConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn scaled(&self, timeout_ms: u64) -> Duration {
        let scale = if self.timeout_scale.is_finite() && self.timeout_scale > 0.0 {
            self.timeout_scale
        } else {
            1.0
        };
        Duration::from_millis((timeout_ms as f64 * scale).round() as u64)
    }
}
