//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::load(&p),
                _ => Ok(Config::default()),
            },
        }
    }

    /// `~/.patternsense/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".patternsense").join("config.toml"))
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.patternsense/logs`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.lsh.num_hashes, 64);
        assert_eq!(config.correlation.window_ms, 1000);
    }

    #[test]
    fn test_load_basic_config() {
        let content = r#"
            [lsh]
            num_hashes = 128
            num_bands = 32

            [correlation]
            window_ms = 1500
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.lsh.num_hashes, 128);
        assert_eq!(config.lsh.num_bands, 32);
        assert_eq!(config.lsh.max_depth, 6);
        assert_eq!(config.correlation.window_ms, 1500);
        assert_eq!(config.correlation.tick_interval_ms, 500);
    }

    #[test]
    fn test_load_detection_weights() {
        let content = r#"
            [detection.weights]
            structural = 0.4
            phrasal = 0.2
            semantic = 0.1
            behavioral = 0.3

            [detection.thresholds]
            structural = 0.1
            semantic = 0.3
            behavioral = 0.5
            verified = 0.8
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.detection.weights.structural, 0.4);
        assert_eq!(config.detection.thresholds.verified, 0.8);
        assert_eq!(config.detection.max_candidates, 10);
    }

    #[test]
    fn test_load_pattern_override() {
        let content = r#"
            [patterns.chat]
            selectors = [".messenger"]

            [patterns.chat.rules]
            has_text_input = 1.0
            has_repeated_children = 2.0
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        let over = &config.patterns["chat"];
        assert_eq!(over.selectors.as_ref().unwrap(), &vec![".messenger".to_string()]);
        assert_eq!(over.rules.as_ref().unwrap().len(), 2);
        assert!(over.scan_repeated_children.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[snapshot]").unwrap();
        writeln!(file, "max_retained = 4").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.snapshot.max_retained, 4);
        assert_eq!(config.snapshot.max_text_len, 200);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[verifier]").unwrap();
        writeln!(file, "frame_interval_ms = 32").unwrap();

        let config = ConfigLoader::load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.verifier.frame_interval_ms, 32);
    }

    #[test]
    fn test_load_invalid_toml() {
        let content = "invalid = [unclosed";
        let result = ConfigLoader::load_str(content);
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_load_wrong_type() {
        let content = r#"
            [lsh]
            num_hashes = "many"
        "#;
        assert!(ConfigLoader::load_str(content).is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("PATTERNSENSE_TEST_LEVEL", "debug");
        }
        let content = "[logging]\nlevel = \"${PATTERNSENSE_TEST_LEVEL}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.logging.level, "debug");
        unsafe {
            std::env::remove_var("PATTERNSENSE_TEST_LEVEL");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_TEST_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_no_tilde() {
        let path = "/var/log/patternsense";
        assert_eq!(ConfigLoader::expand_path(path), path);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/logs");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/logs"));
    }

    #[test]
    fn test_default_path_under_home() {
        if let Some(path) = ConfigLoader::default_path() {
            assert!(path.ends_with(".patternsense/config.toml"));
        }
    }
}
