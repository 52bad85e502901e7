//! YAML configuration for the ingestion pipeline.
//!
//! A single file describes the validation policy, how progress is driven, and
//! how the command-line tool logs.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # Course material uploads
//! version: "1.0"
//! name: "course-materials"
//!
//! policy:
//!   allowed_types:
//!     - application/pdf
//!     - application/vnd.openxmlformats-officedocument.presentationml.presentation
//!   max_size_bytes: 10485760
//!   allow_multiple: true
//!
//! progress:
//!   mode: stepped
//!   step: 15
//!   interval_ms: 200
//!
//! logging:
//!   level: "info"
//!   json: false
//! ```
//!
//! Every section is optional. Without a `progress` section the pipeline steps
//! by 10% every 100 ms.

use std::fs;
use std::path::Path;

use ingest::{PolicyError, ValidationPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::ProgressMode;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid policy: {0}")]
    Policy(#[from] PolicyError),
}

/// Top-level configuration of one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Which files a selection accepts
    #[serde(default)]
    pub policy: ValidationPolicy,

    /// How per-file progress advances
    #[serde(default)]
    pub progress: ProgressMode,

    /// Log output of the command-line tool
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.policy.validate()?;
        self.progress.validate().map_err(ConfigLoadError::Validation)?;
        self.logging.validate()?;

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            policy: ValidationPolicy::default(),
            progress: ProgressMode::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"lms_ingest=debug"`
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.level.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "logging.level must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "quiz attachments"
policy:
  allowed_types: ["image/png", "image/jpeg"]
  max_size_bytes: 2097152
progress:
  mode: transfer
  chunk_size: 4096
"#;

        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name.as_deref(), Some("quiz attachments"));
        assert!(config.policy.allows_type("image/png"));
        assert_eq!(config.policy.max_size_bytes, Some(2_097_152));
        assert!(!config.policy.allow_multiple);
        assert_eq!(config.progress, ProgressMode::Transfer { chunk_size: 4096 });
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
policy:
  allow_multiple: true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = PipelineConfig::from_file(temp_file.path()).unwrap();
        assert!(config.policy.allow_multiple);
        assert_eq!(config.progress, ProgressMode::default());
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(config.name.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unsupported_version() {
        let result = PipelineConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(result, Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"));
    }

    #[test]
    fn test_policy_validation() {
        let yaml = r#"
version: "1.0"
policy:
  allowed_types: []
"#;

        let result = PipelineConfig::from_yaml(yaml);
        assert!(matches!(
            result,
            Err(ConfigLoadError::Policy(PolicyError::EmptyAllowedTypes))
        ));
    }

    #[test]
    fn test_progress_validation() {
        let yaml = r#"
version: "1.0"
progress:
  mode: stepped
  step: 0
"#;

        let result = PipelineConfig::from_yaml(yaml);
        assert!(result.unwrap_err().to_string().contains("progress.step"));
    }

    #[test]
    fn test_missing_file() {
        let result = PipelineConfig::from_file("/no/such/ingest.yaml");
        assert!(matches!(result, Err(ConfigLoadError::FileRead(_))));
    }
}
