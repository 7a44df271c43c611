use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{FinderError, Result};

pub const CONFIG_ENV_VAR: &str = "CLASS_SCAN_CONFIG";

/// Tunables for enumeration and line classification.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Source file extension, without the dot.
    pub extension: String,
    /// Entries whose file name starts with this are skipped.
    pub hidden_prefix: String,
    /// A root path ending in this marker is scanned non-recursively.
    pub non_recursive_marker: String,
    pub namespace_separator: String,
    /// Leading tokens that end the scan of a file with no declaration.
    pub stop_tokens: Vec<String>,
    /// Scan the files of each root on the rayon pool.
    pub parallel: bool,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            extension: "php".to_string(),
            hidden_prefix: ".".to_string(),
            non_recursive_marker: "/*".to_string(),
            namespace_separator: "\\".to_string(),
            stop_tokens: ["return", "exit", "die"]
                .into_iter()
                .map(String::from)
                .collect(),
            parallel: false,
        }
    }
}

impl FinderConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).map_err(|e| FinderError::file_system(path, e))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by `CLASS_SCAN_CONFIG`, or the defaults when unset.
    pub fn resolve() -> Result<Self> {
        match env::var(CONFIG_ENV_VAR) {
            Ok(p) if !p.trim().is_empty() => Self::from_json_file(Path::new(p.trim())),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(FinderError::Configuration(
                "source extension must not be empty".to_string(),
            ));
        }
        if self.namespace_separator.is_empty() {
            return Err(FinderError::Configuration(
                "namespace separator must not be empty".to_string(),
            ));
        }
        if let Some(bad) = self
            .stop_tokens
            .iter()
            .find(|t| t.is_empty() || t.chars().any(char::is_whitespace))
        {
            return Err(FinderError::Configuration(format!(
                "stop token must be a single non-empty word: {bad:?}"
            )));
        }
        Ok(())
    }

    pub(crate) fn source_extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| FinderError::file_system("tmp", e))?;
        let path = dir.path().join("scan.json");
        std::fs::write(&path, r#"{ "extension": "inc", "stop_tokens": ["return"] }"#)
            .map_err(|e| FinderError::file_system(&path, e))?;

        let config = FinderConfig::from_json_file(&path)?;
        assert_eq!(config.extension, "inc");
        assert_eq!(config.stop_tokens, vec!["return".to_string()]);
        assert_eq!(config.namespace_separator, "\\");
        assert!(!config.parallel);
        Ok(())
    }

    #[test]
    fn validate_rejects_blank_stop_token() {
        let config = FinderConfig {
            stop_tokens: vec!["return".to_string(), " ".to_string()],
            ..FinderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FinderError::Configuration(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            FinderConfig::from_json_file(&path),
            Err(FinderError::Json(_))
        ));
    }

    #[test]
    fn missing_config_file_is_a_file_system_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FinderConfig::from_json_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, FinderError::FileSystem { .. }));
    }
}
