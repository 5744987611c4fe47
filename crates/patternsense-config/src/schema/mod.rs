//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use patternsense_protocols::{Pattern, PatternSpec, StructuralRule};

use crate::error::ConfigError;

mod schema_engine;

pub use schema_engine::*;

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub lsh: LshConfig,

    #[serde(default)]
    pub correlation: CorrelationConfig,

    #[serde(default)]
    pub snapshot: SnapshotConfig,

    #[serde(default)]
    pub verifier: VerifierConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-pattern overrides keyed by pattern name.
    #[serde(default)]
    pub patterns: BTreeMap<String, PatternOverride>,
}

impl Config {
    /// Effective spec for a pattern: the built-in spec with any configured
    /// override applied on top.
    pub fn pattern_spec(&self, pattern: Pattern) -> Result<PatternSpec, ConfigError> {
        let mut spec = PatternSpec::builtin(pattern);
        let Some(over) = self
            .patterns
            .iter()
            .find(|(name, _)| name.parse::<Pattern>().ok() == Some(pattern))
            .map(|(_, o)| o)
        else {
            return Ok(spec);
        };

        if let Some(ref selectors) = over.selectors {
            spec.selectors = selectors.clone();
        }
        if let Some(ref rules) = over.rules {
            let mut parsed = BTreeMap::new();
            for (name, weight) in rules {
                let rule: StructuralRule = name.parse().map_err(|message| ConfigError::InvalidValue {
                    field: format!("patterns.{}.rules.{}", pattern, name),
                    message,
                })?;
                parsed.insert(rule, *weight);
            }
            spec.rules = parsed;
        }
        if let Some(scan) = over.scan_repeated_children {
            spec.scan_repeated_children = scan;
        }
        Ok(spec)
    }

    /// Effective specs for every known pattern.
    pub fn pattern_specs(&self) -> Result<BTreeMap<Pattern, PatternSpec>, ConfigError> {
        Pattern::ALL
            .iter()
            .map(|p| self.pattern_spec(*p).map(|spec| (*p, spec)))
            .collect()
    }
}

/// Override of a built-in pattern spec. Absent fields keep the built-in value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternOverride {
    #[serde(default)]
    pub selectors: Option<Vec<String>>,

    /// Rule name to weight; replaces the whole built-in rule table.
    #[serde(default)]
    pub rules: Option<BTreeMap<String, f64>>,

    #[serde(default)]
    pub scan_repeated_children: Option<bool>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    /// Directory for daily-rolling log files.
    #[serde(default)]
    pub file_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file_dir: None,
        }
    }
}
