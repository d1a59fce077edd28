use crate::models::Severity;
use crate::modify::Rename;
use crate::parsers::ParserConfig;
use crate::pipeline::AdapterSpec;
use crate::promotion::PromotionSpec;
use crate::severity::SeverityConfig;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%L%z";

/// Pre-4.4 text format: `2019-02-06T09:22:43.967-0500 I COMMAND  [conn1] dropDatabase test 12ms`
const LEGACY: &str = r"^(?<timestamp>[^ ]*)\s+(?<s>\w)\s+(?<component>[^ ]+)\s+\[(?<context>[^\]]+)]\s+(?<message>.*?) *(?<ms>(\d+))?(:?ms)?$";

pub fn spec() -> AdapterSpec {
    AdapterSpec::new(
        "mongodb",
        vec![
            // 4.4+ structured log; the time key is nested as t.$date and only
            // becomes parseable after promotion
            ParserConfig::json()
                .time("time", TIME_FORMAT)
                .typed("id", "integer")
                .typed("message", "string"),
            ParserConfig::regex(LEGACY)
                .time("timestamp", TIME_FORMAT)
                .typed("message", "string")
                .typed("id", "integer")
                .typed("s", "string")
                .typed("component", "string")
                .typed("context", "string"),
        ],
    )
    .with_promotion(
        PromotionSpec::lift("t.$date", "time")
            .with_prefix("temp_ts_")
            .reparse_with(vec![ParserConfig::regex(r"^(?<time>.+)$").time("time", TIME_FORMAT)])
            .discard("time"),
    )
    // WiredTiger messages are nested in attr.message
    .with_promotion(
        PromotionSpec::lift("attr.message", "msg")
            .with_prefix("temp_attributes_")
            .nest_remaining("attributes"),
    )
    .with_renames(vec![
        Rename::soft("c", "component"),
        Rename::soft("ctx", "context"),
        Rename::soft("msg", "message"),
        Rename::hard("s", "severity"),
    ])
    .with_severity(
        SeverityConfig::new("severity", true)
            .levels(&["D", "D1", "D2", "D3", "D4", "D5"], Severity::Debug)
            .levels(&["I"], Severity::Info)
            .levels(&["E"], Severity::Error)
            .levels(&["F"], Severity::Fatal)
            .levels(&["W"], Severity::Warning),
    )
    .with_include_paths(&["/var/log/mongodb/mongod.log*"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeverityValue;
    use crate::pipeline::Pipeline;
    use serde_json::{json, Value};

    fn pipeline() -> Pipeline {
        Pipeline::build(&spec()).unwrap()
    }

    #[test]
    fn test_structured_log_line() {
        let result = pipeline().normalize(
            r#"{"t":{"$date":"2020-11-19T18:23:51.023+00:00"},"s":"I","c":"NETWORK","id":4915701,"ctx":"main","msg":"Initialized wire specification","attr":{"spec":{"incomingExternalClient":{"minWireVersion":0}}}}"#,
        );
        let record = &result.record;

        assert_eq!(result.parser_index(), Some(0));
        assert_eq!(
            record.timestamp.map(|t| t.to_rfc3339()),
            Some("2020-11-19T18:23:51.023+00:00".to_string())
        );
        assert!(!record.timestamp_fallback);
        assert_eq!(record.severity, Some(SeverityValue::Canonical(Severity::Info)));
        assert_eq!(
            Value::Object(record.fields.clone()),
            json!({
                "severity": "I",
                "component": "NETWORK",
                "id": 4915701,
                "context": "main",
                "message": "Initialized wire specification",
                "attributes": {"spec": {"incomingExternalClient": {"minWireVersion": 0}}}
            })
        );
    }

    #[test]
    fn test_wiredtiger_message_is_promoted() {
        let result = pipeline().normalize(
            r#"{"t":{"$date":"2021-03-04T10:00:00.000+00:00"},"s":"I","c":"STORAGE","id":22430,"ctx":"WTCheckpointThread","msg":"WiredTiger message","attr":{"message":"[1614852000:1][1:0x7f]: saving checkpoint snapshot min: 37"}}"#,
        );
        let record = &result.record;
        assert_eq!(
            record.message(),
            Some("[1614852000:1][1:0x7f]: saving checkpoint snapshot min: 37")
        );
        assert!(record.get("attributes").is_none());
        assert!(record.fields.keys().all(|key| !key.starts_with("temp_")));
    }

    #[test]
    fn test_legacy_text_line() {
        let result = pipeline().normalize("2019-02-06T09:22:43.967-0500 I COMMAND  [conn1] dropDatabase test");
        let record = &result.record;

        assert_eq!(result.parser_index(), Some(1));
        assert_eq!(record.fields["component"], json!("COMMAND"));
        assert_eq!(record.fields["context"], json!("conn1"));
        assert_eq!(record.message(), Some("dropDatabase test"));
        assert_eq!(record.severity, Some(SeverityValue::Canonical(Severity::Info)));
        assert_eq!(
            record.timestamp.map(|t| t.to_rfc3339()),
            Some("2019-02-06T14:22:43.967+00:00".to_string())
        );
    }

    #[test]
    fn test_debug_levels() {
        let result = pipeline().normalize(
            r#"{"t":{"$date":"2020-11-19T18:23:51.023+00:00"},"s":"D2","c":"QUERY","id":1,"ctx":"conn5","msg":"plan"}"#,
        );
        assert_eq!(result.record.severity, Some(SeverityValue::Canonical(Severity::Debug)));
    }
}
