use crate::models::Severity;
use crate::multiline::MultilineRule;
use crate::parsers::ParserConfig;
use crate::pipeline::AdapterSpec;
use crate::severity::SeverityConfig;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%L %z";
const RECORD_BEGIN: &str = r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}.\d{3,} \w+";

/// Default `log_line_prefix = '%m [%p] '`, optionally followed by `user@database`
const DEFAULT_PREFIX: &str = r"^(?<time>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}.\d{3,} \w+)\s*\[(?<tid>\d+)\](?:\s+(?<user>\S*)@(?<database>\S*))?\s*(?<level>\w+):\s+(?<message>[\s\S]*)";

/// `log_line_prefix = '%m %d %u [%p]'` as shipped by SLES
const SLES_PREFIX: &str = r"^(?<time>\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}.\d{3,} \w+)\s*(?:\s+(?<database>\S*)\s+(?<user>\S*))?\s*\[(?<tid>\d+)\]\s*(?<level>\w+):\s+(?<message>[\s\S]*)";

pub fn spec() -> AdapterSpec {
    AdapterSpec::new(
        "postgresql_general",
        vec![
            ParserConfig::regex(DEFAULT_PREFIX)
                .time("time", TIME_FORMAT)
                .typed("tid", "integer"),
            ParserConfig::regex(SLES_PREFIX)
                .time("time", TIME_FORMAT)
                .typed("tid", "integer"),
        ],
    )
    .with_multiline(MultilineRule::timestamp_anchored(RECORD_BEGIN))
    .with_severity(
        SeverityConfig::new("level", true)
            .levels(
                &["DEBUG1", "DEBUG2", "DEBUG3", "DEBUG4", "DEBUG5", "DETAIL", "STATEMENT"],
                Severity::Debug,
            )
            .levels(&["INFO", "LOG", "NOTICE"], Severity::Info)
            .levels(&["ERROR"], Severity::Error)
            .levels(&["WARNING"], Severity::Warning)
            .levels(&["FATAL", "PANIC"], Severity::Critical),
    )
    .with_include_paths(&[
        "/var/log/postgresql/postgresql*.log",
        "/var/lib/pgsql/data/log/postgresql*.log",
        "/var/lib/pgsql/*/data/log/postgresql*.log",
    ])
}
