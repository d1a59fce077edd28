use crate::error::{ConfigError, ParseError};
use crate::models::{value_as_text, FieldType};
use crate::timestamp::TimeLayout;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Common interface for the parsers a [`ParserList`](crate::ParserList) tries in order
pub trait LogParser: Send + Sync {
    /// Extract fields from `text`, or `None` when this parser does not recognize it
    fn parse(&self, text: &str) -> Option<Extraction>;
    fn can_parse(&self, text: &str) -> bool;
    fn format_type(&self) -> FormatType;

    /// Every field this parser can produce, when that is known before parsing
    fn field_names(&self) -> Option<Vec<String>> {
        None
    }
}

/// Parser kinds an adapter can configure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    Regex,
    Json,
}

/// Fields produced by one successful parse, before they become a record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub fields: Map<String, Value>,
    pub timestamp: Option<DateTime<Utc>>,
    pub timestamp_fallback: bool,
    pub warnings: Vec<ParseError>,
}

/// Options shared by every parser kind: which field holds the timestamp,
/// its layout, and per-field type coercions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserShared {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, String>,
    /// `^` and `$` match at line boundaries inside a joined record
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multi_line: bool,
}

/// One entry of an adapter's parser list, as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum ParserConfig {
    Regex {
        regex: String,
        #[serde(flatten)]
        shared: ParserShared,
    },
    Json {
        #[serde(flatten)]
        shared: ParserShared,
    },
}

impl ParserConfig {
    pub fn regex(pattern: &str) -> Self {
        ParserConfig::Regex {
            regex: pattern.to_string(),
            shared: ParserShared::default(),
        }
    }

    pub fn json() -> Self {
        ParserConfig::Json {
            shared: ParserShared::default(),
        }
    }

    /// Designate the timestamp field and its layout
    pub fn time(mut self, time_key: &str, time_format: &str) -> Self {
        let shared = self.shared_mut();
        shared.time_key = Some(time_key.to_string());
        shared.time_format = Some(time_format.to_string());
        self
    }

    /// Declare a coercion (`string`, `integer`, `float` or `bool`) for a field
    pub fn typed(mut self, field: &str, type_name: &str) -> Self {
        self.shared_mut()
            .types
            .insert(field.to_string(), type_name.to_string());
        self
    }

    /// Anchor `^`/`$` at every line of a multiline record instead of the whole text
    pub fn multi_line(mut self) -> Self {
        self.shared_mut().multi_line = true;
        self
    }

    pub fn shared(&self) -> &ParserShared {
        match self {
            ParserConfig::Regex { shared, .. } | ParserConfig::Json { shared } => shared,
        }
    }

    fn shared_mut(&mut self) -> &mut ParserShared {
        match self {
            ParserConfig::Regex { shared, .. } | ParserConfig::Json { shared } => shared,
        }
    }

    /// Compile into a parser; all configuration errors surface here
    pub fn build(&self) -> Result<Arc<dyn LogParser>, ConfigError> {
        match self {
            ParserConfig::Regex { regex, shared } => Ok(Arc::new(RegexParser::new(regex, shared)?)),
            ParserConfig::Json { shared } => Ok(Arc::new(JsonParser::new(shared)?)),
        }
    }
}

/// Compiled form of [`ParserShared`]
#[derive(Debug, Clone)]
pub(crate) struct SharedOptions {
    time_key: Option<String>,
    layout: Option<TimeLayout>,
    types: BTreeMap<String, FieldType>,
}

impl SharedOptions {
    pub(crate) fn compile(shared: &ParserShared) -> Result<Self, ConfigError> {
        let layout = shared
            .time_format
            .as_deref()
            .map(TimeLayout::new)
            .transpose()?;

        let mut types = BTreeMap::new();
        for (field_name, type_name) in &shared.types {
            let field_type = FieldType::from_name(type_name).ok_or_else(|| ConfigError::UnknownFieldType {
                field_name: field_name.clone(),
                type_name: type_name.clone(),
            })?;
            types.insert(field_name.clone(), field_type);
        }

        Ok(Self {
            time_key: shared.time_key.clone(),
            layout,
            types,
        })
    }

    pub(crate) fn time_key(&self) -> Option<&str> {
        self.time_key.as_deref()
    }

    pub(crate) fn typed_fields(&self) -> impl Iterator<Item = &String> {
        self.types.keys()
    }

    /// Apply coercions and timestamp assignment to freshly extracted fields
    pub(crate) fn apply(&self, mut fields: Map<String, Value>) -> Extraction {
        let mut warnings = Vec::new();

        for (field_name, field_type) in &self.types {
            let Some(value) = fields.get_mut(field_name) else {
                continue;
            };
            let Some(text) = value_as_text(value) else {
                continue;
            };
            match field_type.coerce(&text) {
                Some(coerced) => *value = coerced,
                None => {
                    tracing::trace!(field = %field_name, value = %text, "type coercion failed, keeping raw value");
                    *value = Value::String(text.clone());
                    warnings.push(ParseError::FieldCoercionError {
                        field_name: field_name.clone(),
                        expected_type: field_type.name().to_string(),
                        value: text,
                    });
                }
            }
        }

        let mut timestamp = None;
        let mut timestamp_fallback = false;
        if let Some(time_key) = &self.time_key {
            if let Some(text) = fields.get(time_key).and_then(value_as_text) {
                match self.parse_timestamp(&text) {
                    Ok(parsed) => {
                        timestamp = Some(parsed);
                        fields.shift_remove(time_key);
                    }
                    Err(error) => {
                        tracing::debug!(%error, "timestamp did not match layout, using ingestion time");
                        timestamp_fallback = true;
                        warnings.push(error);
                    }
                }
            }
        }

        Extraction {
            fields,
            timestamp,
            timestamp_fallback,
            warnings,
        }
    }

    fn parse_timestamp(&self, text: &str) -> Result<DateTime<Utc>, ParseError> {
        match &self.layout {
            Some(layout) => layout.parse(text),
            None => DateTime::parse_from_rfc3339(text.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| ParseError::TimestampParseError {
                    input: text.to_string(),
                    layout: "rfc3339".to_string(),
                }),
        }
    }
}

// Re-export individual parser modules
pub mod json_parser;
pub mod regex_parser;

pub use json_parser::JsonParser;
pub use regex_parser::RegexParser;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_sets_shared_options() {
        let config = ParserConfig::regex(r"^(?<time>\S+) (?<message>.*)$")
            .time("time", "%Y-%m-%dT%H:%M:%S%z")
            .typed("tid", "integer");
        let shared = config.shared();
        assert_eq!(shared.time_key.as_deref(), Some("time"));
        assert_eq!(shared.types.get("tid").map(String::as_str), Some("integer"));
    }

    #[test]
    fn test_unknown_type_is_config_error() {
        let config = ParserConfig::json().typed("pid", "hex");
        assert!(matches!(config.build(), Err(ConfigError::UnknownFieldType { .. })));
    }

    #[test]
    fn test_apply_keeps_raw_value_on_coercion_failure() {
        let shared = ParserShared {
            types: BTreeMap::from([("line".to_string(), "integer".to_string())]),
            ..Default::default()
        };
        let options = SharedOptions::compile(&shared).unwrap();
        let mut fields = Map::new();
        fields.insert("line".to_string(), json!("12a"));

        let extraction = options.apply(fields);
        assert_eq!(extraction.fields["line"], json!("12a"));
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn test_apply_without_layout_reads_rfc3339() {
        let shared = ParserShared {
            time_key: Some("ts".to_string()),
            ..Default::default()
        };
        let options = SharedOptions::compile(&shared).unwrap();
        let mut fields = Map::new();
        fields.insert("ts".to_string(), json!("2025-12-29T10:21:03Z"));

        let extraction = options.apply(fields);
        assert!(extraction.timestamp.is_some());
        assert!(!extraction.fields.contains_key("ts"));
    }

    #[test]
    fn test_parser_config_yaml_shape() {
        let yaml = r#"
format: regex
regex: '^(?<level>\w+) (?<message>.*)$'
time_key: time
time_format: "%Y"
types:
  pid: integer
"#;
        let config: ParserConfig = serde_yaml::from_str(yaml).unwrap();
        match config {
            ParserConfig::Regex { regex, shared } => {
                assert!(regex.starts_with("^(?<level>"));
                assert_eq!(shared.time_key.as_deref(), Some("time"));
                assert_eq!(shared.types.len(), 1);
            }
            other => panic!("expected regex parser, got {:?}", other),
        }
    }
}
