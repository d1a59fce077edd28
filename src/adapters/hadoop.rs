use crate::models::Severity;
use crate::multiline::MultilineRule;
use crate::parsers::ParserConfig;
use crate::pipeline::AdapterSpec;
use crate::severity::SeverityConfig;

// 2022-02-01 18:09:47,136 INFO org.apache.hadoop.hdfs.server.namenode.FSEditLog: Edit logging is async:true
const HADOOP: &str = r"(?<timestamp>\d+-\d+-\d+ \d+:\d+:\d+,\d+)\s+(?<severity>\w+)\s+(?<source>\S+):\s+(?<message>[\S\s]*)";

pub fn spec() -> AdapterSpec {
    AdapterSpec::new(
        "hadoop",
        vec![ParserConfig::regex(HADOOP).time("timestamp", "%Y-%m-%d %H:%M:%S,%L")],
    )
    .with_multiline(vec![
        MultilineRule::new(crate::multiline::START_STATE, r"^\d+-\d+-\d+ \d+:\d+:\d+,\d+.*", "cont"),
        MultilineRule::new("cont", r"^(?!\d+-\d+-\d+ \d+:\d+:\d+,\d+).*", "cont"),
    ])
    .with_severity(
        SeverityConfig::new("severity", true)
            .levels(&["TRACE", "DEBUG"], Severity::Debug)
            .levels(&["INFO"], Severity::Info)
            .levels(&["WARN", "DEPRECATION"], Severity::Warning)
            .levels(&["ERROR", "CRITICAL"], Severity::Error)
            .levels(&["FATAL"], Severity::Fatal),
    )
    .with_include_paths(&["/opt/hadoop/logs/hadoop-*.log", "/opt/hadoop/logs/yarn-*.log"])
}
