//! Configuration validation.

use patternsense_protocols::{GuaranteeLevel, Pattern, Selector, StructuralRule};

use crate::error::ConfigError;
use crate::schema::{Config, PatternOverride};

const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_detection(config, &mut result);
        Self::validate_lsh(config, &mut result);
        Self::validate_correlation(config, &mut result);
        Self::validate_snapshot(config, &mut result);
        Self::validate_verifier(config, &mut result);
        Self::validate_patterns(config, &mut result);

        Ok(result)
    }

    fn validate_detection(config: &Config, result: &mut ValidationResult) {
        let weights = &config.detection.weights;
        for (name, value) in [
            ("structural", weights.structural),
            ("phrasal", weights.phrasal),
            ("semantic", weights.semantic),
            ("behavioral", weights.behavioral),
        ] {
            if !(0.0..=1.0).contains(&value) {
                result.add_error(ValidationError::new(
                    format!("detection.weights.{}", name),
                    format!("weight must be within [0, 1], got {}", value),
                ));
            }
        }
        if (weights.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            result.add_error(ValidationError::new(
                "detection.weights",
                format!("weights must sum to 1.0, got {:.3}", weights.sum()),
            ));
        }

        let thresholds = &config.detection.thresholds;
        let mut previous = 0.0;
        for level in GuaranteeLevel::ALL {
            let value = thresholds.threshold(level);
            let path = format!(
                "detection.thresholds.{}",
                level.to_string().to_ascii_lowercase()
            );
            if !(0.0..=1.0).contains(&value) {
                result.add_error(ValidationError::new(
                    path,
                    format!("threshold must be within [0, 1], got {}", value),
                ));
            } else if value < previous {
                result.add_error(ValidationError::new(
                    path,
                    format!("threshold {} is below the previous level's {}", value, previous),
                ));
            }
            previous = value;
        }

        if config.detection.max_candidates == 0 {
            result.add_error(ValidationError::new(
                "detection.max_candidates",
                "max_candidates must be greater than 0",
            ));
        }

        if !(0.0..1.0).contains(&config.detection.min_structural_score) {
            result.add_error(ValidationError::new(
                "detection.min_structural_score",
                "min_structural_score must be within [0, 1)",
            ));
        }
    }

    fn validate_lsh(config: &Config, result: &mut ValidationResult) {
        let lsh = &config.lsh;
        if lsh.num_hashes == 0 {
            result.add_error(ValidationError::new(
                "lsh.num_hashes",
                "num_hashes must be greater than 0",
            ));
        }
        if lsh.num_bands == 0 {
            result.add_error(ValidationError::new(
                "lsh.num_bands",
                "num_bands must be greater than 0",
            ));
        } else if lsh.num_hashes % lsh.num_bands != 0 {
            result.add_error(ValidationError::new(
                "lsh.num_bands",
                format!(
                    "num_bands ({}) must divide num_hashes ({})",
                    lsh.num_bands, lsh.num_hashes
                ),
            ));
        }
        if lsh.shingle_size == 0 {
            result.add_error(ValidationError::new(
                "lsh.shingle_size",
                "shingle_size must be greater than 0",
            ));
        }
        if lsh.max_depth > 32 {
            result.add_warning(ValidationWarning::new(
                "lsh.max_depth",
                "max_depth is very high (>32), signatures will be dominated by deep noise",
            ));
        }
    }

    fn validate_correlation(config: &Config, result: &mut ValidationResult) {
        let correlation = &config.correlation;
        if correlation.window_ms == 0 {
            result.add_error(ValidationError::new(
                "correlation.window_ms",
                "window_ms must be greater than 0",
            ));
        }
        if correlation.tick_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "correlation.tick_interval_ms",
                "tick_interval_ms must be greater than 0",
            ));
        }
        if correlation.max_queue == 0 {
            result.add_error(ValidationError::new(
                "correlation.max_queue",
                "max_queue must be greater than 0",
            ));
        }
        if !(0.0..=1.0).contains(&correlation.min_confidence) {
            result.add_error(ValidationError::new(
                "correlation.min_confidence",
                format!(
                    "min_confidence must be within [0, 1], got {}",
                    correlation.min_confidence
                ),
            ));
        }
        if correlation.tick_interval_ms > correlation.window_ms.saturating_mul(2) {
            result.add_warning(ValidationWarning::new(
                "correlation.tick_interval_ms",
                "tick interval exceeds twice the window; actions may expire before any tick sees them",
            ));
        }
    }

    fn validate_snapshot(config: &Config, result: &mut ValidationResult) {
        if config.snapshot.max_retained < 2 {
            result.add_warning(ValidationWarning::new(
                "snapshot.max_retained",
                "fewer than 2 retained snapshots leaves nothing to diff against",
            ));
        }
    }

    fn validate_verifier(config: &Config, result: &mut ValidationResult) {
        let verifier = &config.verifier;
        if verifier.frame_interval_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "verifier.frame_interval_ms",
                "frame_interval_ms of 0 is raised to 1ms",
            ));
        }
        if !verifier.timeout_scale.is_finite() || verifier.timeout_scale <= 0.0 {
            result.add_error(ValidationError::new(
                "verifier.timeout_scale",
                format!("timeout_scale must be positive, got {}", verifier.timeout_scale),
            ));
        }
    }

    fn validate_patterns(config: &Config, result: &mut ValidationResult) {
        for (name, over) in &config.patterns {
            match name.parse::<Pattern>() {
                Ok(_) => Self::validate_override(name, over, result),
                Err(message) => result.add_error(ValidationError::new(
                    format!("patterns.{}", name),
                    message,
                )),
            }
        }
    }

    fn validate_override(name: &str, over: &PatternOverride, result: &mut ValidationResult) {
        if let Some(ref selectors) = over.selectors {
            if selectors.is_empty() {
                result.add_warning(ValidationWarning::new(
                    format!("patterns.{}.selectors", name),
                    "empty selector list; only repeated-children scanning can find candidates",
                ));
            }
            for selector in selectors {
                if let Err(e) = Selector::parse(selector) {
                    result.add_error(ValidationError::new(
                        format!("patterns.{}.selectors", name),
                        format!("'{}': {}", selector, e),
                    ));
                }
            }
        }

        if let Some(ref rules) = over.rules {
            if rules.is_empty() {
                result.add_error(ValidationError::new(
                    format!("patterns.{}.rules", name),
                    "rule table cannot be empty",
                ));
            }
            for (rule, weight) in rules {
                let path = format!("patterns.{}.rules.{}", name, rule);
                if let Err(message) = rule.parse::<StructuralRule>() {
                    result.add_error(ValidationError::new(path.clone(), message));
                }
                if !weight.is_finite() || *weight < 0.0 {
                    result.add_error(ValidationError::new(
                        path,
                        format!("weight must be non-negative, got {}", weight),
                    ));
                }
            }
            if !rules.is_empty() && rules.values().all(|w| *w == 0.0) {
                result.add_error(ValidationError::new(
                    format!("patterns.{}.rules", name),
                    "at least one rule must carry a positive weight",
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
