use crate::error::ConfigError;
use crate::models::{value_as_text, LogRecord, ParseStatus};
use crate::parse_result::ParseResult;
use crate::parsers::{Extraction, LogParser, ParserConfig};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Ordered parser alternatives. The first parser that matches wins, so the
/// configured order is the priority between overlapping formats.
#[derive(Clone, Default)]
pub struct ParserList {
    parsers: Vec<Arc<dyn LogParser>>,
}

impl ParserList {
    pub fn new(parsers: Vec<Arc<dyn LogParser>>) -> Self {
        Self { parsers }
    }

    pub fn from_configs(configs: &[ParserConfig]) -> Result<Self, ConfigError> {
        let parsers = configs
            .iter()
            .map(ParserConfig::build)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { parsers })
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Union of the fields every parser can produce, or `None` when some
    /// parser (JSON) only knows its fields at parse time
    pub fn known_fields(&self) -> Option<BTreeSet<String>> {
        if self.parsers.is_empty() {
            return None;
        }
        let mut fields = BTreeSet::new();
        for parser in &self.parsers {
            fields.extend(parser.field_names()?);
        }
        Some(fields)
    }

    fn first_match(&self, text: &str) -> Option<(usize, Extraction)> {
        self.parsers
            .iter()
            .enumerate()
            .find_map(|(index, parser)| parser.parse(text).map(|extraction| (index, extraction)))
    }

    /// Turn one completed record text into a structured record.
    ///
    /// Never fails: text no parser recognizes becomes an unparsed record whose
    /// only field is the message.
    pub fn extract(&self, raw: &str) -> ParseResult {
        let start_time = Instant::now();

        let result = match self.first_match(raw) {
            Some((parser_index, extraction)) => {
                let Extraction {
                    fields,
                    timestamp,
                    timestamp_fallback,
                    warnings,
                } = extraction;
                let mut record = LogRecord::from_fields(fields, raw, ParseStatus::Parsed { parser_index });
                record.timestamp = timestamp;
                record.timestamp_fallback = timestamp_fallback;
                ParseResult::new(record, warnings)
            }
            None => {
                tracing::trace!(parsers = self.parsers.len(), "no parser matched, emitting unparsed record");
                ParseResult::new(LogRecord::unparsed(raw), Vec::new())
            }
        };

        result.with_processing_time(start_time.elapsed().as_micros() as u64)
    }

    /// Parse the value of one field of an already structured record and fold
    /// the results back into it.
    ///
    /// On a match the parsed field is replaced by the extracted fields; fields
    /// already on the record are kept (first write wins). If the field is
    /// missing, not text, or matches no parser, the record is returned as is.
    pub fn extract_field(&self, mut record: LogRecord, key: &str) -> ParseResult {
        let start_time = Instant::now();

        let Some(text) = record.get(key).and_then(value_as_text) else {
            return ParseResult::new(record, Vec::new());
        };
        let Some((parser_index, extraction)) = self.first_match(&text) else {
            return ParseResult::new(record, Vec::new());
        };

        record.remove(key);
        let warnings = merge_extraction(&mut record, extraction);
        record.parse_status = ParseStatus::Parsed { parser_index };

        ParseResult::new(record, warnings).with_processing_time(start_time.elapsed().as_micros() as u64)
    }
}

impl std::fmt::Debug for ParserList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserList")
            .field(
                "formats",
                &self.parsers.iter().map(|p| p.format_type()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Merge extracted fields into `record` without overwriting existing fields.
/// The timestamp is only taken when the record has none yet. Returns the
/// extraction's warnings.
pub(crate) fn merge_extraction(record: &mut LogRecord, extraction: Extraction) -> Vec<crate::ParseError> {
    for (key, value) in extraction.fields {
        if !record.fields.contains_key(&key) {
            record.fields.insert(key, value);
        }
    }
    if record.timestamp.is_none() {
        if let Some(timestamp) = extraction.timestamp {
            record.timestamp = Some(timestamp);
            record.timestamp_fallback = false;
        } else if extraction.timestamp_fallback {
            record.timestamp_fallback = true;
        }
    }
    extraction.warnings
}

/// Run `parsers` over `raw`; free-function form of [`ParserList::extract`]
pub fn extract(raw: &str, parsers: &ParserList) -> LogRecord {
    parsers.extract(raw).into_record()
}
