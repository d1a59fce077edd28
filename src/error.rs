use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-record problems encountered while normalizing a log record.
///
/// None of these are fatal: the record is still emitted, and the error is
/// carried as a warning on the [`ParseResult`](crate::ParseResult) so that
/// statistics and debug logging can account for it.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ParseError {
    /// A captured value did not convert to its declared type
    #[error("field '{field_name}' could not be coerced to {expected_type}: '{value}'")]
    FieldCoercionError {
        field_name: String,
        expected_type: String,
        value: String,
    },
    /// The timestamp capture did not match its declared layout
    #[error("failed to parse timestamp '{input}' with layout '{layout}'")]
    TimestampParseError {
        input: String,
        layout: String,
    },
    /// JSON parsing failed with a syntax error
    #[error("JSON syntax error: {message}")]
    JsonSyntaxError {
        message: String,
    },
    /// JSON is well formed but not an object
    #[error("JSON is not an object, found: {actual_type}")]
    JsonNotObject {
        actual_type: String,
    },
}

/// Construction-time failures. These are the only errors that stop a
/// pipeline from being built, and they never occur mid-stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("regex error for pattern '{pattern}': {error_message}")]
    RegexError {
        pattern: String,
        error_message: String,
    },
    #[error("time key '{time_key}' is not a named capture group of '{pattern}'")]
    MissingTimeKeyGroup {
        time_key: String,
        pattern: String,
    },
    #[error("invalid time layout '{layout}': {error_message}")]
    InvalidTimeLayout {
        layout: String,
        error_message: String,
    },
    #[error("multiline rules: {error_message}")]
    InvalidMultilineRules {
        error_message: String,
    },
    #[error("promotion of '{source_path}': {error_message}")]
    InvalidPromotion {
        source_path: String,
        error_message: String,
    },
    #[error("unknown field type '{type_name}' for field '{field_name}'")]
    UnknownFieldType {
        field_name: String,
        type_name: String,
    },
    #[error("unknown adapter '{name}'")]
    UnknownAdapter {
        name: String,
    },
    #[error("cannot load configuration file '{path}': {error_message}")]
    ConfigFileError {
        path: String,
        error_message: String,
    },
    #[error("configuration error for '{parameter}': {error_message}")]
    ConfigurationError {
        parameter: String,
        error_message: String,
    },
}

impl ParseError {
    /// Short stable name used as a statistics key
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::FieldCoercionError { .. } => "FieldCoercionError",
            ParseError::TimestampParseError { .. } => "TimestampParseError",
            ParseError::JsonSyntaxError { .. } => "JsonSyntaxError",
            ParseError::JsonNotObject { .. } => "JsonNotObject",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let error = ParseError::FieldCoercionError {
            field_name: "tid".to_string(),
            expected_type: "integer".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(error.to_string(), "field 'tid' could not be coerced to integer: 'abc'");
        assert_eq!(error.kind(), "FieldCoercionError");
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::MissingTimeKeyGroup {
            time_key: "time".to_string(),
            pattern: r"^(?<ts>\S+)".to_string(),
        };
        assert!(error.to_string().contains("'time'"));
    }
}
