pub mod models;
pub mod error;
pub mod timestamp;
pub mod parse_result;
pub mod parsers;
pub mod extractor;
pub mod multiline;
pub mod promotion;
pub mod severity;
pub mod modify;
pub mod pipeline;
pub mod adapters;
pub mod registry;
pub mod config;
pub mod statistics;
pub mod parallel;
pub mod cli;
pub mod commands;

#[cfg(test)]
mod pipeline_tests;

pub use models::*;
pub use error::{ConfigError, ParseError};
pub use timestamp::TimeLayout;
pub use parse_result::ParseResult;
pub use parsers::{Extraction, FormatType, JsonParser, LogParser, ParserConfig, RegexParser};
pub use extractor::{extract, ParserList};
pub use multiline::{MultilineAggregator, MultilineRule, MultilineRules};
pub use promotion::{promote, FieldPath, NestedPromoter, PromotionSpec};
pub use severity::{SeverityConfig, SeverityMap, SeverityMapper};
pub use modify::{apply_renames, Rename};
pub use pipeline::{normalize_lines, AdapterSpec, Pipeline, StreamNormalizer};
pub use registry::AdapterRegistry;
pub use config::NormalizerConfig;
pub use statistics::{NormalizationStatistics, SharedStatistics, StatisticsMonitor};
pub use parallel::{spawn_stream_worker, ParallelConfig, ParallelNormalizer, StreamOutput, StreamWorker};
