use crate::error::{ConfigError, ParseError};
use crate::extractor::ParserList;
use crate::models::{LogRecord, ParseStatus, MESSAGE_FIELD};
use crate::modify::{apply_renames, Rename};
use crate::multiline::{MultilineAggregator, MultilineRule, MultilineRules};
use crate::parse_result::ParseResult;
use crate::parsers::{JsonParser, ParserConfig};
use crate::promotion::{NestedPromoter, PromotionSpec};
use crate::severity::{SeverityConfig, SeverityMapper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Everything one application contributes to normalization.
///
/// Pure data: built-in adapters construct it in code, user adapters load it
/// from the configuration file, and [`Pipeline::build`] compiles it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterSpec {
    pub name: String,
    pub parsers: Vec<ParserConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multiline: Vec<MultilineRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub promotions: Vec<PromotionSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renames: Vec<Rename>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<SeverityConfig>,
    /// Default file globs for this application's logs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_paths: Vec<String>,
    /// Field parsed when input arrives as structured records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
}

impl AdapterSpec {
    pub fn new(name: &str, parsers: Vec<ParserConfig>) -> Self {
        Self {
            name: name.to_string(),
            parsers,
            multiline: Vec::new(),
            promotions: Vec::new(),
            renames: Vec::new(),
            severity: None,
            include_paths: Vec::new(),
            key_name: None,
        }
    }

    pub fn with_multiline(mut self, rules: Vec<MultilineRule>) -> Self {
        self.multiline = rules;
        self
    }

    pub fn with_promotion(mut self, promotion: PromotionSpec) -> Self {
        self.promotions.push(promotion);
        self
    }

    pub fn with_renames(mut self, renames: Vec<Rename>) -> Self {
        self.renames.extend(renames);
        self
    }

    pub fn with_severity(mut self, severity: SeverityConfig) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_include_paths(mut self, paths: &[&str]) -> Self {
        self.include_paths = paths.iter().map(|p| p.to_string()).collect();
        self
    }
}

/// Compiled adapter: extractor, promotions, renames and severity mapping in
/// that order. Immutable and shared across streams.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    parsers: ParserList,
    multiline: Option<Arc<MultilineRules>>,
    promoters: Vec<NestedPromoter>,
    renames: Vec<Rename>,
    severity: SeverityMapper,
    key_name: String,
    include_paths: Vec<String>,
    max_lines: Option<usize>,
}

impl Pipeline {
    pub fn build(spec: &AdapterSpec) -> Result<Self, ConfigError> {
        if spec.name.trim().is_empty() {
            return Err(ConfigError::ConfigurationError {
                parameter: "name".to_string(),
                error_message: "adapter name cannot be empty".to_string(),
            });
        }

        let parsers = ParserList::from_configs(&spec.parsers)?;
        if parsers.is_empty() {
            tracing::warn!(adapter = %spec.name, "adapter has no parsers, every record will be unparsed");
        }

        let multiline = if spec.multiline.is_empty() {
            None
        } else {
            Some(Arc::new(MultilineRules::compile(&spec.multiline)?))
        };

        let promoters = spec
            .promotions
            .iter()
            .map(NestedPromoter::new)
            .collect::<Result<Vec<_>, _>>()?;
        check_promotion_sources(&parsers, &spec.promotions)?;

        Ok(Self {
            name: spec.name.clone(),
            parsers,
            multiline,
            promoters,
            renames: spec.renames.clone(),
            severity: SeverityMapper::new(&spec.name, spec.severity.as_ref())?,
            key_name: spec.key_name.clone().unwrap_or_else(|| MESSAGE_FIELD.to_string()),
            include_paths: spec.include_paths.clone(),
            max_lines: None,
        })
    }

    /// Cap multiline records at `max_lines` lines for streams created from now on
    pub fn with_max_lines(mut self, max_lines: Option<usize>) -> Self {
        self.max_lines = max_lines;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn include_paths(&self) -> &[String] {
        &self.include_paths
    }

    pub fn parser_count(&self) -> usize {
        self.parsers.len()
    }

    pub fn has_multiline(&self) -> bool {
        self.multiline.is_some()
    }

    /// Normalize one completed record text
    pub fn normalize(&self, raw: &str) -> ParseResult {
        self.normalize_at(raw, Utc::now())
    }

    /// Like [`normalize`](Self::normalize) with an explicit ingestion instant
    pub fn normalize_at(&self, raw: &str, ingested_at: DateTime<Utc>) -> ParseResult {
        let start_time = Instant::now();
        let result = self.parsers.extract(raw);
        self.finish(result, ingested_at, start_time)
    }

    /// Normalize a record that arrived already structured; its `key_name`
    /// field is parsed and the rest of the record is kept.
    pub fn normalize_structured(&self, fields: Map<String, Value>) -> ParseResult {
        self.normalize_structured_at(fields, Utc::now())
    }

    pub fn normalize_structured_at(&self, fields: Map<String, Value>, ingested_at: DateTime<Utc>) -> ParseResult {
        let start_time = Instant::now();
        let raw = serde_json::to_string(&fields).unwrap_or_default();
        let record = LogRecord::from_fields(fields, &raw, ParseStatus::Unparsed);
        let result = self.parsers.extract_field(record, &self.key_name);
        self.finish(result, ingested_at, start_time)
    }

    /// Structured input given as one JSON line. Lines that are not JSON
    /// objects are normalized as plain text.
    pub fn normalize_json_line(&self, line: &str) -> ParseResult {
        match JsonParser::parse_object(line) {
            Ok(fields) => self.normalize_structured(fields),
            Err(error) => {
                tracing::debug!(adapter = %self.name, %error, "structured input line is not a JSON object");
                let mut result = self.normalize(line);
                result.warnings.push(error);
                result
            }
        }
    }

    fn finish(&self, result: ParseResult, ingested_at: DateTime<Utc>, start_time: Instant) -> ParseResult {
        let ParseResult {
            mut record,
            mut warnings,
            line_number,
            ..
        } = result;

        for promoter in &self.promoters {
            record = promoter.promote_collecting(record, &mut warnings);
        }
        apply_renames(&mut record, &self.renames);
        self.severity.apply(&mut record);

        if record.timestamp.is_none() {
            record.set_timestamp(ingested_at);
        } else {
            record.timestamp_fallback = false;
        }

        log_warnings(&self.name, &warnings);
        let mut result = ParseResult::new(record, warnings)
            .with_processing_time(start_time.elapsed().as_micros() as u64);
        result.line_number = line_number;
        result
    }

    /// Fresh aggregator for a new stream, if this adapter joins lines
    pub fn aggregator(&self) -> Option<MultilineAggregator> {
        self.multiline
            .as_ref()
            .map(|rules| MultilineAggregator::new(Arc::clone(rules)).with_max_lines(self.max_lines))
    }
}

/// With a parser list whose fields are all known up front, every promotion
/// must start from a field some parser captures or an earlier promotion creates
fn check_promotion_sources(parsers: &ParserList, promotions: &[PromotionSpec]) -> Result<(), ConfigError> {
    let Some(mut available) = parsers.known_fields() else {
        return Ok(());
    };
    for promotion in promotions {
        let root = promotion.source.split('.').next().unwrap_or_default();
        if !available.contains(root) {
            return Err(ConfigError::InvalidPromotion {
                source_path: promotion.source.clone(),
                error_message: format!("no parser captures a '{}' group", root),
            });
        }
        available.insert(promotion.destination.clone());
        if let Some(target) = &promotion.nest_remaining {
            available.insert(target.clone());
        }
    }
    Ok(())
}

fn log_warnings(adapter: &str, warnings: &[ParseError]) {
    for warning in warnings {
        tracing::debug!(adapter = %adapter, kind = warning.kind(), %warning, "record normalized with warning");
    }
}

/// Per-stream driver: owns the stream's aggregator and feeds completed
/// records through the shared pipeline. Never shared between streams.
#[derive(Debug)]
pub struct StreamNormalizer {
    pipeline: Arc<Pipeline>,
    aggregator: Option<MultilineAggregator>,
    lines_seen: usize,
    record_start_line: usize,
}

impl StreamNormalizer {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        let aggregator = pipeline.aggregator();
        Self {
            pipeline,
            aggregator,
            lines_seen: 0,
            record_start_line: 1,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }

    /// Feed the next line; returns a normalized record when one completes
    pub fn push_line(&mut self, line: &str) -> Option<ParseResult> {
        self.lines_seen += 1;
        let line_number = self.lines_seen;

        let Some(aggregator) = self.aggregator.as_mut() else {
            return Some(self.pipeline.normalize(line).with_line_number(line_number));
        };

        let was_pending = aggregator.has_pending();
        match aggregator.feed(line) {
            Some(completed) => {
                let start_line = std::mem::replace(&mut self.record_start_line, line_number);
                Some(self.pipeline.normalize(&completed).with_line_number(start_line))
            }
            None => {
                if !was_pending {
                    self.record_start_line = line_number;
                }
                None
            }
        }
    }

    /// End of stream: normalize whatever is still buffered
    pub fn finish(&mut self) -> Option<ParseResult> {
        let completed = self.aggregator.as_mut()?.flush()?;
        tracing::trace!(adapter = %self.pipeline.name(), "stream finished with a buffered record");
        Some(
            self.pipeline
                .normalize(&completed)
                .with_line_number(self.record_start_line),
        )
    }
}

impl Drop for StreamNormalizer {
    fn drop(&mut self) {
        if self.aggregator.as_ref().is_some_and(MultilineAggregator::has_pending) {
            tracing::warn!(adapter = %self.pipeline.name(), "stream dropped with an unflushed record");
        }
    }
}

/// Run a whole stream of lines through `pipeline`
pub fn normalize_lines<'a, I>(pipeline: Arc<Pipeline>, lines: I) -> Vec<ParseResult>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut stream = StreamNormalizer::new(pipeline);
    let mut results: Vec<ParseResult> = lines.into_iter().filter_map(|line| stream.push_line(line)).collect();
    results.extend(stream.finish());
    results
}
