use crate::error::ConfigError;
use crate::parsers::{Extraction, FormatType, LogParser, ParserShared, SharedOptions};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

/// Regex parser: named capture groups become fields
#[derive(Debug, Clone)]
pub struct RegexParser {
    pattern: Regex,
    shared: SharedOptions,
}

impl RegexParser {
    pub fn new(pattern: &str, shared: &ParserShared) -> Result<Self, ConfigError> {
        let regex_error = |message: String| ConfigError::RegexError {
            pattern: pattern.to_string(),
            error_message: message,
        };
        if let Some(escape) = word_boundary_escape(pattern) {
            return Err(regex_error(format!(
                "`\\{}` is a word boundary here, not a literal; write `{}` without the backslash",
                escape, escape
            )));
        }
        let compiled = RegexBuilder::new(pattern)
            .multi_line(shared.multi_line)
            .build()
            .map_err(|e| regex_error(e.to_string()))?;
        let shared = SharedOptions::compile(shared)?;

        let parser = Self {
            pattern: compiled,
            shared,
        };
        parser.validate()?;
        Ok(parser)
    }

    fn group_names(&self) -> impl Iterator<Item = &str> {
        self.pattern.capture_names().flatten()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(time_key) = self.shared.time_key() {
            if !self.group_names().any(|name| name == time_key) {
                return Err(ConfigError::MissingTimeKeyGroup {
                    time_key: time_key.to_string(),
                    pattern: self.pattern.as_str().to_string(),
                });
            }
        }

        for field in self.shared.typed_fields() {
            if !self.group_names().any(|name| name == field) {
                tracing::warn!(
                    field = %field,
                    pattern = %self.pattern.as_str(),
                    "type declared for a field the pattern never captures"
                );
            }
        }
        Ok(())
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// First `\<` or `\>` escape in `pattern`. Collector configs use them for
/// literal angle brackets; `regex` reads them as word-boundary assertions.
fn word_boundary_escape(pattern: &str) -> Option<char> {
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped @ ('<' | '>')) => return Some(escaped),
                _ => continue,
            }
        }
    }
    None
}

impl LogParser for RegexParser {
    fn parse(&self, text: &str) -> Option<Extraction> {
        let captures = self.pattern.captures(text)?;

        // Unset optional groups stay absent rather than becoming ""
        let mut fields = Map::new();
        for name in self.group_names() {
            if let Some(capture) = captures.name(name) {
                fields.insert(name.to_string(), Value::String(capture.as_str().to_string()));
            }
        }

        Some(self.shared.apply(fields))
    }

    fn can_parse(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    fn format_type(&self) -> FormatType {
        FormatType::Regex
    }

    fn field_names(&self) -> Option<Vec<String>> {
        Some(self.group_names().map(str::to_string).collect())
    }
}
