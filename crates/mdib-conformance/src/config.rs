//! Engine configuration, read from TOML.
//!
//! ```toml
//! schema_version = 1
//!
//! [test_parameter]
//! biceps_547_time_interval = 5
//!
//! [enabled]
//! "BICEPS.R0033" = false
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalogue;

pub const ENGINE_CONFIG_SCHEMA_VERSION: u32 = 1;

/// Default for `test_parameter.biceps_547_time_interval`, in seconds.
pub const DEFAULT_BICEPS_547_TIME_INTERVAL_SECS: u64 = 5;

fn default_schema_version() -> u32 {
    ENGINE_CONFIG_SCHEMA_VERSION
}

fn default_biceps_547_time_interval() -> u64 {
    DEFAULT_BICEPS_547_TIME_INTERVAL_SECS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestParameters {
    /// Seconds a device may take after a manipulation finished to report the
    /// manipulated metric state.
    #[serde(default = "default_biceps_547_time_interval")]
    pub biceps_547_time_interval: u64,
}

impl Default for TestParameters {
    fn default() -> Self {
        Self {
            biceps_547_time_interval: DEFAULT_BICEPS_547_TIME_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub test_parameter: TestParameters,
    /// Requirement id -> enabled. Requirements not listed are enabled.
    #[serde(default)]
    pub enabled: BTreeMap<String, bool>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: ENGINE_CONFIG_SCHEMA_VERSION,
            test_parameter: TestParameters::default(),
            enabled: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    UnsupportedSchemaVersion { got: u32 },
    UnknownRequirement { id: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValidationError::UnsupportedSchemaVersion { got } => write!(
                f,
                "schema_version must be {ENGINE_CONFIG_SCHEMA_VERSION}, got {got}"
            ),
            ConfigValidationError::UnknownRequirement { id } => {
                write!(f, "enabled: unknown requirement id '{id}'")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config TOML decode failed: {source}")]
    Decode {
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {}", join_errors(.errors))]
    Invalid { errors: Vec<ConfigValidationError> },
}

fn join_errors(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Every problem with `config`, empty when it is usable.
pub fn validate_config(config: &EngineConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    if config.schema_version != ENGINE_CONFIG_SCHEMA_VERSION {
        errors.push(ConfigValidationError::UnsupportedSchemaVersion {
            got: config.schema_version,
        });
    }
    for id in config.enabled.keys() {
        if !catalogue::is_known(id) {
            errors.push(ConfigValidationError::UnknownRequirement { id: id.clone() });
        }
    }
    errors
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(raw).map_err(|source| ConfigError::Decode { source })?;
        let errors = validate_config(&config);
        if !errors.is_empty() {
            return Err(ConfigError::Invalid { errors });
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.get(id).copied().unwrap_or(true)
    }

    /// Grace period after a manipulation finished.
    pub fn manipulation_buffer(&self) -> Duration {
        Duration::from_secs(self.test_parameter.biceps_547_time_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.manipulation_buffer(), Duration::from_secs(5));
        assert!(config.is_enabled(catalogue::BICEPS_R0033));
    }

    #[test]
    fn parses_parameters_and_switches() {
        let config = EngineConfig::from_toml_str(
            r#"
schema_version = 1

[test_parameter]
biceps_547_time_interval = 12

[enabled]
"BICEPS.R0033" = false
"BICEPS.B-128" = true
"#,
        )
        .unwrap();
        assert_eq!(config.manipulation_buffer(), Duration::from_secs(12));
        assert!(!config.is_enabled(catalogue::BICEPS_R0033));
        assert!(config.is_enabled(catalogue::BICEPS_B_128));
    }

    #[test]
    fn rejects_unknown_requirement_ids() {
        let err = EngineConfig::from_toml_str("[enabled]\n\"BICEPS.R9999\" = false\n").unwrap_err();
        match err {
            ConfigError::Invalid { errors } => assert_eq!(
                errors,
                vec![ConfigValidationError::UnknownRequirement {
                    id: "BICEPS.R9999".into()
                }]
            ),
            other => panic!("expected Invalid, got: {other}"),
        }
    }

    #[test]
    fn rejects_unknown_schema_version_and_fields() {
        let err = EngineConfig::from_toml_str("schema_version = 3\n").unwrap_err();
        assert!(err.to_string().contains("schema_version must be 1, got 3"));

        let err = EngineConfig::from_toml_str("verbose = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Decode { .. }));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[test_parameter]\nbiceps_547_time_interval = 1").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.manipulation_buffer(), Duration::from_secs(1));

        let missing = EngineConfig::load(Path::new("/nonexistent/mdib-check.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
