use crate::error::ParseError;
use crate::models::{LogRecord, ParseStatus};

/// Result of running a parser list over one record's text.
///
/// Extraction never fails outright: `record` is always usable. `warnings`
/// collects the soft failures (coercion, timestamp layout) met on the way.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub record: LogRecord,
    pub warnings: Vec<ParseError>,
    pub line_number: Option<usize>,
    pub processing_time_micros: Option<u64>,
}

impl ParseResult {
    pub fn new(record: LogRecord, warnings: Vec<ParseError>) -> Self {
        Self {
            record,
            warnings,
            line_number: None,
            processing_time_micros: None,
        }
    }

    /// Position of the parser that matched, if any
    pub fn parser_index(&self) -> Option<usize> {
        match self.record.parse_status {
            ParseStatus::Parsed { parser_index } => Some(parser_index),
            ParseStatus::Unparsed => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.parser_index().is_some()
    }

    pub fn with_line_number(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }

    pub fn with_processing_time(mut self, processing_time_micros: u64) -> Self {
        self.processing_time_micros = Some(processing_time_micros);
        self
    }

    pub fn into_record(self) -> LogRecord {
        self.record
    }

    /// Warnings joined into one line, prefixed with the line number when known
    pub fn detailed_warning_description(&self) -> Option<String> {
        if self.warnings.is_empty() {
            return None;
        }
        let joined = self
            .warnings
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Some(match self.line_number {
            Some(line) => format!("Line {}: {}", line, joined),
            None => joined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detailed_warning_description() {
        let result = ParseResult::new(
            LogRecord::unparsed("x"),
            vec![ParseError::TimestampParseError {
                input: "bad".to_string(),
                layout: "%Y".to_string(),
            }],
        )
        .with_line_number(7);

        let description = result.detailed_warning_description().unwrap();
        assert!(description.starts_with("Line 7: "));
        assert!(description.contains("'bad'"));
        assert_eq!(result.parser_index(), None);
    }

    #[test]
    fn test_no_warnings_no_description() {
        let result = ParseResult::new(LogRecord::unparsed("x"), Vec::new());
        assert!(result.detailed_warning_description().is_none());
        assert!(!result.is_parsed());
    }
}
