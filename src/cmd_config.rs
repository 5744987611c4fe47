//! Configuration subcommands: patterns and validate.

use std::path::Path;

use anyhow::{Context, bail};

use patternsense_config::{Config, ConfigLoader, ConfigValidator};

/// Print the effective per-pattern specs after config overrides.
pub(crate) fn patterns(config: &Config, json: bool) -> anyhow::Result<()> {
    let specs = config.pattern_specs().context("invalid pattern overrides")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    for (pattern, spec) in &specs {
        println!("{}", pattern);
        println!("  selectors: {}", spec.selectors.join(", "));
        let rules: Vec<String> = spec
            .rules
            .iter()
            .map(|(rule, weight)| format!("{}={}", rule, weight))
            .collect();
        println!("  rules:     {}", rules.join(", "));
        if spec.scan_repeated_children {
            println!("  scans repeated children");
        }
    }
    Ok(())
}

/// Validate the loaded configuration, failing on any error.
pub(crate) fn validate(config: &Config, path: Option<&Path>) -> anyhow::Result<()> {
    let source = path
        .map(|p| p.display().to_string())
        .or_else(|| {
            ConfigLoader::default_path()
                .filter(|p| p.exists())
                .map(|p| p.display().to_string())
        })
        .unwrap_or_else(|| "built-in defaults".to_string());

    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if !result.is_valid() {
        bail!("{} has {} configuration error(s)", source, result.errors.len());
    }
    println!("{} is valid", source);
    Ok(())
}
