//! YAML configuration file support.
//!
//! Every stage configuration lives in one file so a deployment can be tuned
//! without recompiling. Missing sections fall back to their defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "lecture-decks"
//!
//! ingest:
//!   max_payload_bytes: 5242880
//!   preview_chars: 200
//!   enable_repair: true
//!   unwrap_output_envelopes: true
//!
//! normalize:
//!   highlight: true
//!   fetch_images: true
//!   image_timeout_secs: 10
//!
//! naming:
//!   default_name: "Medical_Flashcards"
//!   strategy: "lecture_tags"
//! ```

use std::fs;
use std::path::Path;

use canonical::NormalizeConfig;
use ingest::IngestConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming::NamingConfig;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration for the whole conversion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct FlashdeckConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub naming: NamingConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for FlashdeckConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            ingest: IngestConfig::default(),
            normalize: NormalizeConfig::default(),
            naming: NamingConfig::default(),
        }
    }
}

impl FlashdeckConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: FlashdeckConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to YAML, e.g. to print the effective configuration.
    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        self.ingest
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("ingest: {e}")))?;
        self.normalize
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("normalize: {e}")))?;
        self.naming.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingStrategy;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = FlashdeckConfig::from_yaml("{}").expect("defaults");
        assert_eq!(cfg, FlashdeckConfig::default());
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let yaml = r#"
version: "1"
normalize:
  highlight: true
naming:
  strategy: lecture_tags
"#;
        let cfg = FlashdeckConfig::from_yaml(yaml).expect("valid");
        assert!(cfg.normalize.highlight);
        assert!(cfg.normalize.fetch_images);
        assert_eq!(cfg.naming.strategy, NamingStrategy::LectureTags);
        assert_eq!(cfg.ingest, IngestConfig::default());
    }

    #[test]
    fn unsupported_version_rejected() {
        let err = FlashdeckConfig::from_yaml("version: \"2.0\"").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn stage_validation_runs() {
        let err = FlashdeckConfig::from_yaml("ingest:\n  preview_chars: 0\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(msg) if msg.starts_with("ingest:")));

        let err = FlashdeckConfig::from_yaml("normalize:\n  image_timeout_secs: 0\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(msg) if msg.starts_with("normalize:")));
    }

    #[test]
    fn bad_yaml_is_parse_error() {
        let err = FlashdeckConfig::from_yaml("ingest: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigLoadError::YamlParse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "naming:\n  default_name: Review\n  strategy: lecture_tags").expect("write");
        let cfg = FlashdeckConfig::from_file(file.path()).expect("load");
        assert_eq!(cfg.naming.default_name, "Review");
        assert_eq!(cfg.naming.strategy, NamingStrategy::LectureTags);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = FlashdeckConfig::from_file("/nonexistent/flashdeck.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileRead(_)));
    }

    #[test]
    fn yaml_round_trip_preserves_values() {
        let mut cfg = FlashdeckConfig::default();
        cfg.normalize.highlight = true;
        let yaml = cfg.to_yaml().expect("serialize");
        assert_eq!(FlashdeckConfig::from_yaml(&yaml).expect("parse"), cfg);
    }
}
