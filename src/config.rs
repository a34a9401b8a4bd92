use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BmpmError, BmpmResult};

/// How the detected language set drives the rule cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LanguageStrategy {
    /// Run the cascade once for every surviving language and union the codes
    #[default]
    PerLanguage,
    /// Run the cascade once: with the sole language's tables if exactly one
    /// language survives, otherwise with the `any` tables
    Combined,
}

/// Runtime options of the encoder.
///
/// ```json
/// { "max_branches": 128, "concatenate": true, "language_strategy": "combined" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cap on in-progress candidates after every rule step
    pub max_branches: usize,
    /// Cap on the codes reported for a word, and for a concatenated name
    pub max_codes: usize,
    /// Overrides the variant's own concatenation mode when set
    pub concatenate: Option<bool>,
    pub language_strategy: LanguageStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_branches: 256,
            max_codes: 1024,
            concatenate: None,
            language_strategy: LanguageStrategy::PerLanguage,
        }
    }
}

impl EngineConfig {
    pub fn with_max_branches(mut self, max_branches: usize) -> Self {
        self.max_branches = max_branches;
        self
    }

    pub fn with_max_codes(mut self, max_codes: usize) -> Self {
        self.max_codes = max_codes;
        self
    }

    pub fn with_concatenate(mut self, concatenate: bool) -> Self {
        self.concatenate = Some(concatenate);
        self
    }

    pub fn with_language_strategy(mut self, strategy: LanguageStrategy) -> Self {
        self.language_strategy = strategy;
        self
    }

    /// Caps of zero would leave no candidate alive, so both are at least 1.
    pub(crate) fn clamped(mut self) -> Self {
        self.max_branches = self.max_branches.max(1);
        self.max_codes = self.max_codes.max(1);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read options from a JSON file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> BmpmResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| BmpmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content).map_err(|source| BmpmError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_branches, 256);
        assert_eq!(config.max_codes, 1024);
        assert_eq!(config.concatenate, None);
        assert_eq!(config.language_strategy, LanguageStrategy::PerLanguage);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"max_branches": 8, "language_strategy": "combined"}"#)
                .unwrap();
        assert_eq!(config.max_branches, 8);
        assert_eq!(config.max_codes, 1024);
        assert_eq!(config.language_strategy, LanguageStrategy::Combined);
    }

    #[test]
    fn test_clamped() {
        let config = EngineConfig::default()
            .with_max_branches(0)
            .with_max_codes(0)
            .clamped();
        assert_eq!(config.max_branches, 1);
        assert_eq!(config.max_codes, 1);
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::from_file(Path::new("/nonexistent/bmpm.json"));
        assert!(matches!(result, Err(BmpmError::Io { .. })));
    }
}
