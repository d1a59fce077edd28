use crate::error::ConfigError;
use crate::pipeline::{AdapterSpec, Pipeline};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Top-level configuration file: user adapters plus normalizer settings.
///
/// Loaded from YAML (`.yaml`, `.yml`) or JSON (`.json`); any other extension
/// is read as YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// User-defined adapters; a name shared with a built-in replaces it
    pub adapters: Vec<AdapterSpec>,

    /// Upper bound on lines joined into one multiline record
    pub multiline_max_lines: Option<usize>,

    pub enable_statistics: bool,

    /// Records between periodic statistics reports
    pub statistics_report_interval: usize,

    /// Adapter used when none is named on the command line
    pub default_adapter: Option<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            adapters: Vec::new(),
            multiline_max_lines: None,
            enable_statistics: false,
            statistics_report_interval: 10_000,
            default_adapter: None,
        }
    }
}

impl NormalizerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file_error = |message: String| ConfigError::ConfigFileError {
            path: path.display().to_string(),
            error_message: message,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
        .map_err(file_error)?;

        tracing::debug!(path = %path.display(), adapters = config.adapters.len(), "loaded configuration");
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, String> {
        // an empty file is an empty configuration
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        serde_json::from_str(contents).map_err(|e| e.to_string())
    }

    /// Check settings and compile every user adapter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.statistics_report_interval == 0 {
            return Err(ConfigError::ConfigurationError {
                parameter: "statistics_report_interval".to_string(),
                error_message: "Statistics report interval must be greater than 0".to_string(),
            });
        }
        if self.multiline_max_lines == Some(0) {
            return Err(ConfigError::ConfigurationError {
                parameter: "multiline_max_lines".to_string(),
                error_message: "Multiline max lines must be greater than 0".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for (index, spec) in self.adapters.iter().enumerate() {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::ConfigurationError {
                    parameter: format!("adapters[{}].name", index),
                    error_message: format!("adapter '{}' is defined twice", spec.name),
                });
            }
            Pipeline::build(spec)?;
        }
        Ok(())
    }
}
