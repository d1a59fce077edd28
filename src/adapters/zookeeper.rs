use crate::models::Severity;
use crate::multiline::MultilineRule;
use crate::parsers::ParserConfig;
use crate::pipeline::AdapterSpec;
use crate::severity::SeverityConfig;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%L";
const RECORD_BEGIN: &str = r"^\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2},\d{3}";

// 2022-01-31 17:51:45,451 [myid:1] - INFO  [NIOWorkerThread-3:NIOServerCnxn@514] - Processing mntr command
const WITH_MYID: &str = r"^(?<time>\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2},\d{3})\s\[myid:(?<myid>\d+)?\]\s-\s(?<level>\w+)\s+\[(?<thread>.+):(?<source>.+)@(?<line>\d+)\]\s+-\s*(?<message>[\S\s]*)";
// 2022-01-31 17:51:45,451 - INFO  [NIOWorkerThread-3:NIOServerCnxn@514] - Processing mntr command
const WITHOUT_MYID: &str = r"^(?<time>\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2},\d{3})\s-\s(?<level>\w+)\s+\[(?<thread>.+):(?<source>.+)@(?<line>\d+)\]\s+-\s*(?<message>[\S\s]*)";

pub fn spec() -> AdapterSpec {
    AdapterSpec::new(
        "zookeeper_general",
        vec![
            ParserConfig::regex(WITH_MYID)
                .time("time", TIME_FORMAT)
                .typed("myid", "integer")
                .typed("thread", "string")
                .typed("source", "string")
                .typed("line", "integer"),
            ParserConfig::regex(WITHOUT_MYID)
                .time("time", TIME_FORMAT)
                .typed("thread", "string")
                .typed("source", "string")
                .typed("line", "integer"),
        ],
    )
    .with_multiline(MultilineRule::timestamp_anchored(RECORD_BEGIN))
    .with_severity(
        SeverityConfig::new("level", true)
            .levels(&["TRACE", "DEBUG"], Severity::Debug)
            .levels(&["INFO"], Severity::Info)
            .levels(&["WARN"], Severity::Warning)
            .levels(&["ERROR", "CRITICAL"], Severity::Error)
            .levels(&["FATAL"], Severity::Fatal),
    )
    .with_include_paths(&["/opt/zookeeper/logs/zookeeper-*.out", "/var/log/zookeeper/zookeeper.log"])
}
