use crate::models::Severity;
use crate::multiline::MultilineRule;
use crate::parsers::ParserConfig;
use crate::pipeline::AdapterSpec;
use crate::severity::SeverityConfig;

// 2022-01-31 18:01:20.441571+00:00 [erro] <0.692.0> ** Connection attempt from node 'rabbit_ctl_17@host' rejected. **
const WITH_OFFSET: &str = r"^(?<timestamp>\d+-\d+-\d+\s+\d+:\d+:\d+[.,]\d+\+\d+:\d+) \[(?<severity>\w+)\] <(?<process_id>\d+\.\d+\.\d+)> ?(?<message>.*)$";
// 2023-02-01 12:45:14.705 [info] <0.801.0> Successfully set user tags for user 'admin' to [administrator]
const WITHOUT_OFFSET: &str = r"^(?<timestamp>\d+-\d+-\d+\s+\d+:\d+:\d+[.,]\d+\d+\d+) \[(?<severity>\w+)\] <(?<process_id>\d+\.\d+\.\d+)> ?(?<message>.*)$";

const RECORD_BEGIN: &str = r"^\d+-\d+-\d+ \d+:\d+:\d+\.\d+\+\d+:\d+";

pub fn spec() -> AdapterSpec {
    AdapterSpec::new(
        "rabbitmq",
        vec![
            // crash reports are joined into one record; the first line carries the header
            ParserConfig::regex(WITH_OFFSET)
                .time("timestamp", "%Y-%m-%d %H:%M:%S.%L%z")
                .multi_line(),
            ParserConfig::regex(WITHOUT_OFFSET)
                .time("timestamp", "%Y-%m-%d %H:%M:%S.%L")
                .multi_line(),
        ],
    )
    // crash reports continue on lines of their own:
    // 2022-01-31 18:07:43.557042+00:00 [erro] <0.130.0>
    // BOOT FAILED
    .with_multiline(MultilineRule::timestamp_anchored(RECORD_BEGIN))
    .with_severity(
        SeverityConfig::new("severity", true)
            .levels(&["debug", "debu"], Severity::Debug)
            .levels(&["info"], Severity::Info)
            .levels(&["warning", "warn"], Severity::Warning)
            .levels(&["error", "erro"], Severity::Error)
            .levels(&["noti"], Severity::Default),
    )
    .with_include_paths(&["/var/log/rabbitmq/rabbit*.log"])
}
