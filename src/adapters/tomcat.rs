use crate::models::Severity;
use crate::multiline::MultilineRule;
use crate::parsers::ParserConfig;
use crate::pipeline::AdapterSpec;
use crate::severity::SeverityConfig;

// 13-Jan-2022 16:10:27.715 SEVERE [main] org.apache.catalina.startup.Catalina.stopServer No shutdown port configured.
const CATALINA: &str = r"^(?<time>\d{2}-[A-Z]{1}[a-z]{2}-\d{4}\s\d{2}:\d{2}:\d{2}.\d{3})\s(?<level>[A-Z]+)\s\[(?<module>[^\]]+)\]\s(?<message>(?<source>[\w\.]+)[\S\s]+)";
const RECORD_BEGIN: &str = r"^\d{2}-[A-Z]{1}[a-z]{2}-\d{4}\s\d{2}:\d{2}:\d{2}.\d{3}";

pub fn spec() -> AdapterSpec {
    AdapterSpec::new(
        "tomcat_system",
        vec![ParserConfig::regex(CATALINA).time("time", "%d-%b-%Y %H:%M:%S.%L")],
    )
    .with_multiline(MultilineRule::timestamp_anchored(RECORD_BEGIN))
    .with_severity(
        SeverityConfig::new("level", true)
            .levels(&["FINEST", "FINER", "FINE"], Severity::Debug)
            .levels(&["INFO"], Severity::Info)
            .levels(&["WARNING"], Severity::Warning)
            .levels(&["SEVERE"], Severity::Critical),
    )
    .with_include_paths(&[
        "/opt/tomcat/logs/catalina.out",
        "/var/log/tomcat*/catalina.out",
        "/var/log/tomcat*/catalina.*.log",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeverityValue;
    use crate::pipeline::{normalize_lines, Pipeline};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_stack_trace_joins_record() {
        let pipeline = Arc::new(Pipeline::build(&spec()).unwrap());
        let results = normalize_lines(
            pipeline,
            [
                "13-Jan-2022 16:10:27.715 SEVERE [main] org.apache.catalina.util.LifecycleBase.handleSubClassException Failed to initialize component",
                "\torg.apache.catalina.LifecycleException: Protocol handler initialization failed",
                "\t\tat org.apache.catalina.connector.Connector.initInternal(Connector.java:1049)",
            ],
        );

        assert_eq!(results.len(), 1);
        let record = &results[0].record;
        assert_eq!(record.fields["module"], json!("main"));
        assert_eq!(
            record.fields["source"],
            json!("org.apache.catalina.util.LifecycleBase.handleSubClassException")
        );
        assert!(record.message().is_some_and(|m| m.ends_with("(Connector.java:1049)")));
        assert_eq!(record.severity, Some(SeverityValue::Canonical(Severity::Critical)));
        assert_eq!(
            record.timestamp.map(|t| t.to_rfc3339()),
            Some("2022-01-13T16:10:27.715+00:00".to_string())
        );
    }
}
