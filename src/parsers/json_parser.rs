use crate::error::{ConfigError, ParseError};
use crate::parsers::{Extraction, FormatType, LogParser, ParserShared, SharedOptions};
use serde_json::{Map, Value};

/// JSON parser for records that are one JSON object per record
#[derive(Debug, Clone)]
pub struct JsonParser {
    shared: SharedOptions,
}

impl JsonParser {
    pub fn new(shared: &ParserShared) -> Result<Self, ConfigError> {
        Ok(Self {
            shared: SharedOptions::compile(shared)?,
        })
    }

    /// Decode `text` as a JSON object, reporting why it is not one
    pub fn parse_object(text: &str) -> Result<Map<String, Value>, ParseError> {
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::Object(object)) => Ok(object),
            Ok(other) => {
                let actual_type = match other {
                    Value::Array(_) => "array",
                    Value::String(_) => "string",
                    Value::Number(_) => "number",
                    Value::Bool(_) => "boolean",
                    Value::Null => "null",
                    Value::Object(_) => "object",
                };
                Err(ParseError::JsonNotObject {
                    actual_type: actual_type.to_string(),
                })
            }
            Err(e) => Err(ParseError::JsonSyntaxError {
                message: e.to_string(),
            }),
        }
    }
}

impl LogParser for JsonParser {
    fn parse(&self, text: &str) -> Option<Extraction> {
        match Self::parse_object(text) {
            Ok(object) => Some(self.shared.apply(object)),
            Err(error) => {
                tracing::trace!(%error, "not a JSON object, trying next parser");
                None
            }
        }
    }

    fn can_parse(&self, text: &str) -> bool {
        text.trim_start().starts_with('{') && Self::parse_object(text).is_ok()
    }

    fn format_type(&self) -> FormatType {
        FormatType::Json
    }
}
