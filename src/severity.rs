use crate::error::ConfigError;
use crate::models::{value_as_text, LogRecord, Severity, SeverityValue, INSTRUMENTATION_SOURCE_LABEL};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Prefix of the provenance label value
pub const INSTRUMENTATION_SOURCE_PREFIX: &str = "lognorm";

/// Severity vocabulary of one application, as written in configuration.
///
/// `map` takes exact, case-sensitive source tokens to canonical level names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityConfig {
    pub source_field: String,
    pub map: BTreeMap<String, String>,
    #[serde(default)]
    pub exclusive: bool,
}

impl SeverityConfig {
    pub fn new(source_field: &str, exclusive: bool) -> Self {
        Self {
            source_field: source_field.to_string(),
            map: BTreeMap::new(),
            exclusive,
        }
    }

    /// Map every token in `tokens` to `level`
    pub fn levels(mut self, tokens: &[&str], level: Severity) -> Self {
        for token in tokens {
            self.map.insert(token.to_string(), level.as_str().to_string());
        }
        self
    }
}

/// Validated token table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeverityMap {
    entries: HashMap<String, Severity>,
}

impl SeverityMap {
    pub fn from_config(config: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let entries = config
            .iter()
            .map(|(token, level)| {
                Severity::from_canonical(level)
                    .map(|severity| (token.clone(), severity))
                    .ok_or_else(|| ConfigError::ConfigurationError {
                        parameter: format!("severity.map.{}", token),
                        error_message: format!("'{}' is not a canonical severity", level),
                    })
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { entries })
    }

    pub fn get(&self, token: &str) -> Option<Severity> {
        self.entries.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Translate a raw source token. Exclusive maps drop unknown tokens,
/// non-exclusive ones pass them through untouched.
pub fn map(raw: &str, severity_map: &SeverityMap, exclusive: bool) -> Option<SeverityValue> {
    match severity_map.get(raw) {
        Some(level) => Some(SeverityValue::Canonical(level)),
        None if exclusive => None,
        None => Some(SeverityValue::Raw(raw.to_string())),
    }
}

/// Final pipeline stage: assigns severity and stamps the provenance label
#[derive(Debug, Clone)]
pub struct SeverityMapper {
    source_field: Option<String>,
    map: SeverityMap,
    exclusive: bool,
    provenance: String,
}

impl SeverityMapper {
    pub fn new(adapter: &str, config: Option<&SeverityConfig>) -> Result<Self, ConfigError> {
        let (source_field, map, exclusive) = match config {
            Some(config) => (
                Some(config.source_field.clone()),
                SeverityMap::from_config(&config.map)?,
                config.exclusive,
            ),
            None => (None, SeverityMap::default(), true),
        };
        Ok(Self {
            source_field,
            map,
            exclusive,
            provenance: format!("{}/{}", INSTRUMENTATION_SOURCE_PREFIX, adapter),
        })
    }

    pub fn apply(&self, record: &mut LogRecord) {
        if let Some(source_field) = &self.source_field {
            let severity = record
                .get(source_field)
                .and_then(value_as_text)
                .and_then(|raw| map(&raw, &self.map, self.exclusive));
            match severity {
                Some(severity) => record.set_severity(severity),
                None => record.severity = None,
            }
        }
        record.set_label(INSTRUMENTATION_SOURCE_LABEL, self.provenance.clone());
    }

    pub fn provenance(&self) -> &str {
        &self.provenance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn warn_only() -> SeverityMap {
        SeverityMap::from_config(&[("WARN".to_string(), "WARNING".to_string())].into_iter().collect()).unwrap()
    }

    #[test]
    fn test_exclusive_drops_unknown_tokens() {
        let table = warn_only();
        assert_eq!(map("WARN", &table, true), Some(SeverityValue::Canonical(Severity::Warning)));
        assert_eq!(map("NOTICE", &table, true), None);
    }

    #[test]
    fn test_non_exclusive_passes_through() {
        let table = warn_only();
        assert_eq!(map("NOTICE", &table, false), Some(SeverityValue::Raw("NOTICE".to_string())));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(map("warn", &warn_only(), true), None);
    }

    #[test]
    fn test_unknown_level_name_is_config_error() {
        let config = [("X".to_string(), "SEVERE".to_string())].into_iter().collect();
        assert!(matches!(
            SeverityMap::from_config(&config),
            Err(ConfigError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_mapper_stamps_label_and_looks_up_integers() {
        let config = SeverityConfig::new("level", true).levels(&["3"], Severity::Error);
        let mapper = SeverityMapper::new("test_app", Some(&config)).unwrap();

        let mut record = LogRecord::unparsed("x");
        record.add_field("level".to_string(), 3);
        mapper.apply(&mut record);

        assert_eq!(record.severity, Some(SeverityValue::Canonical(Severity::Error)));
        assert_eq!(record.labels[INSTRUMENTATION_SOURCE_LABEL], "lognorm/test_app");
        // the source field stays on the record
        assert_eq!(record.fields["level"], json!(3));
    }

    #[test]
    fn test_mapper_without_severity_config_only_labels() {
        let mapper = SeverityMapper::new("plain", None).unwrap();
        let mut record = LogRecord::unparsed("x");
        mapper.apply(&mut record);
        assert!(record.severity.is_none());
        assert_eq!(mapper.provenance(), "lognorm/plain");
        assert_eq!(record.labels.len(), 1);
    }
}
