    use super::*;
    use std::collections::BTreeMap;

    fn with_override(name: &str, over: PatternOverride) -> Config {
        let mut config = Config::default();
        config.patterns.insert(name.to_string(), over);
        config
    }

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_weights_must_sum_to_one() {
        let mut config = Config::default();
        config.detection.weights.phrasal = 0.5;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "detection.weights"));
    }

    #[test]
    fn test_validate_weights_within_tolerance() {
        let mut config = Config::default();
        config.detection.weights.phrasal = 0.3005;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_validate_thresholds_non_decreasing() {
        let mut config = Config::default();
        config.detection.thresholds.behavioral = 0.3;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.path == "detection.thresholds.behavioral")
        );
    }

    #[test]
    fn test_validate_threshold_out_of_range() {
        let mut config = Config::default();
        config.detection.thresholds.verified = 1.5;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.path == "detection.thresholds.verified")
        );
    }

    #[test]
    fn test_validate_bands_must_divide_hashes() {
        let mut config = Config::default();
        config.lsh.num_bands = 10;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "lsh.num_bands"));
    }

    #[test]
    fn test_validate_zero_bands() {
        let mut config = Config::default();
        config.lsh.num_bands = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "lsh.num_bands"));
    }

    #[test]
    fn test_validate_correlation_zero_values() {
        let mut config = Config::default();
        config.correlation.window_ms = 0;
        config.correlation.tick_interval_ms = 0;
        config.correlation.max_queue = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_validate_min_confidence_range() {
        let mut config = Config::default();
        config.correlation.min_confidence = 1.2;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.path == "correlation.min_confidence")
        );
    }

    #[test]
    fn test_validate_slow_tick_warning() {
        let mut config = Config::default();
        config.correlation.tick_interval_ms = 5000;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_validate_unknown_pattern_name() {
        let config = with_override("carousel", PatternOverride::default());

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "patterns.carousel"));
    }

    #[test]
    fn test_validate_bad_selector() {
        let config = with_override(
            "chat",
            PatternOverride {
                selectors: Some(vec!["[class*=chat".to_string()]),
                ..Default::default()
            },
        );

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "patterns.chat.selectors"));
    }

    #[test]
    fn test_validate_empty_selectors_warning() {
        let config = with_override(
            "feed",
            PatternOverride {
                selectors: Some(vec![]),
                ..Default::default()
            },
        );

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_validate_unknown_rule_and_negative_weight() {
        let mut rules = BTreeMap::new();
        rules.insert("has_magic".to_string(), 1.0);
        rules.insert("has_button".to_string(), -2.0);
        let config = with_override(
            "search",
            PatternOverride {
                rules: Some(rules),
                ..Default::default()
            },
        );

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.path == "patterns.search.rules.has_magic")
        );
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.path == "patterns.search.rules.has_button")
        );
    }

    #[test]
    fn test_validate_all_zero_weights() {
        let mut rules = BTreeMap::new();
        rules.insert("has_button".to_string(), 0.0);
        let config = with_override(
            "modal",
            PatternOverride {
                rules: Some(rules),
                ..Default::default()
            },
        );

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "patterns.modal.rules"));
    }

    #[test]
    fn test_validate_good_override() {
        let mut rules = BTreeMap::new();
        rules.insert("has_password_input".to_string(), 3.0);
        rules.insert("has-submit-button".to_string(), 1.0);
        let config = with_override(
            "login",
            PatternOverride {
                selectors: Some(vec!["form.auth".to_string(), "#signin".to_string()]),
                rules: Some(rules),
                scan_repeated_children: None,
            },
        );

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_validate_verifier_timing() {
        let mut config = Config::default();
        config.verifier.timeout_scale = 0.0;
        config.verifier.frame_interval_ms = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "verifier.timeout_scale"));
        assert!(result.warnings.iter().any(|w| w.path == "verifier.frame_interval_ms"));
    }
