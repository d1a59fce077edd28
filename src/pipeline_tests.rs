//! End-to-end checks across aggregation, extraction, promotion, renames and
//! severity mapping.

use crate::models::{ParseStatus, Severity, SeverityValue, INSTRUMENTATION_SOURCE_LABEL};
use crate::modify::{apply_renames, Rename};
use crate::multiline::MultilineRule;
use crate::parsers::ParserConfig;
use crate::pipeline::{normalize_lines, AdapterSpec, Pipeline};
use crate::promotion::PromotionSpec;
use crate::registry::AdapterRegistry;
use crate::severity::SeverityConfig;
use chrono::{TimeZone, Utc};
use quickcheck_macros::quickcheck;
use serde_json::{json, Value};
use std::sync::Arc;

const BEGIN: &str = r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}";

fn general() -> ParserConfig {
    ParserConfig::regex(r"^(?<time>\S+ \S+) (?<level>\w+) (?<message>[\s\S]*)$").time("time", "%Y-%m-%d %H:%M:%S")
}

fn adapter(exclusive: bool) -> AdapterSpec {
    AdapterSpec::new(
        "app",
        vec![
            ParserConfig::regex(r"^(?<time>\S+ \S+) (?<level>\w+) \[(?<thread>[^\]]+)\] (?<message>[\s\S]*)$")
                .time("time", "%Y-%m-%d %H:%M:%S"),
            general(),
        ],
    )
    .with_multiline(MultilineRule::timestamp_anchored(BEGIN))
    .with_severity(SeverityConfig::new("level", exclusive).levels(&["WARN"], Severity::Warning))
}

fn pipeline(spec: &AdapterSpec) -> Arc<Pipeline> {
    Arc::new(Pipeline::build(spec).unwrap())
}

#[test]
fn test_begin_line_plus_continuations_is_one_record() {
    let lines = [
        "2024-01-01 00:00:00 WARN [main] failed",
        "java.lang.IllegalStateException: boom",
        "\tat A.b(A.java:1)",
        "\tat C.d(C.java:2)",
    ];
    let results = normalize_lines(pipeline(&adapter(true)), lines.iter().copied());

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.raw, lines.join("\n"));
    assert_eq!(
        results[0].record.message(),
        Some("failed\njava.lang.IllegalStateException: boom\n\tat A.b(A.java:1)\n\tat C.d(C.java:2)")
    );
}

#[test]
fn test_flush_on_end() {
    let lines = ["2024-01-01 00:00:00 INFO hello", "  continuation"];
    let results = normalize_lines(pipeline(&adapter(true)), lines.iter().copied());

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.raw, "2024-01-01 00:00:00 INFO hello\n  continuation");
    assert_eq!(
        results[0].record.timestamp,
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
}

#[test]
fn test_first_matching_parser_wins() {
    let pipeline = pipeline(&adapter(true));

    let specific = pipeline.normalize("2024-01-01 00:00:00 INFO [main] started");
    assert_eq!(specific.record.parse_status, ParseStatus::Parsed { parser_index: 0 });
    assert_eq!(specific.record.fields["thread"], json!("main"));
    assert_eq!(specific.record.message(), Some("started"));

    let general = pipeline.normalize("2024-01-01 00:00:00 INFO started");
    assert_eq!(general.record.parse_status, ParseStatus::Parsed { parser_index: 1 });
    assert!(general.record.get("thread").is_none());
}

#[test]
fn test_unparsed_record_is_the_raw_text() {
    let spec = AdapterSpec::new("app", vec![general()]);
    let result = pipeline(&spec).normalize("garbage");

    assert!(result.record.is_unparsed());
    assert!(!result.record.timestamp_fallback);
    assert_eq!(result.record.fields.len(), 1);
    assert_eq!(result.record.message(), Some("garbage"));
    assert_eq!(result.record.labels[INSTRUMENTATION_SOURCE_LABEL], "lognorm/app");
}

#[test]
fn test_severity_exclusivity() {
    let line = "2024-01-01 00:00:00 NOTICE disk almost full";

    let exclusive = pipeline(&adapter(true)).normalize(line);
    assert_eq!(exclusive.record.severity, None);

    let passthrough = pipeline(&adapter(false)).normalize(line);
    assert_eq!(passthrough.record.severity, Some(SeverityValue::Raw("NOTICE".to_string())));

    let mapped = pipeline(&adapter(true)).normalize("2024-01-01 00:00:00 WARN disk almost full");
    assert_eq!(mapped.record.severity, Some(SeverityValue::Canonical(Severity::Warning)));
}

#[test]
fn test_promotion_round_trip_without_reparse() {
    let spec = AdapterSpec::new("app", vec![ParserConfig::json()]).with_promotion(PromotionSpec::lift("t.$date", "time"));
    let result = pipeline(&spec).normalize(r#"{"t":{"$date":"2024-01-01T00:00:00.000Z"},"message":"x"}"#);

    assert_eq!(
        Value::Object(result.record.fields),
        json!({"message": "x", "time": "2024-01-01T00:00:00.000Z"})
    );
}

#[test]
fn test_mongodb_structured_record() {
    let registry = AdapterRegistry::builtin();
    let pipeline = registry.pipeline("mongodb").unwrap();
    let result = pipeline.normalize(
        r#"{"t":{"$date":"2020-11-11T19:06:09.215+00:00"},"s":"W","c":"NETWORK","id":22944,"ctx":"conn1","msg":"Connection ended","attr":{"remote":"127.0.0.1:33450","connectionCount":0}}"#,
    );
    let record = &result.record;

    assert_eq!(
        record.timestamp,
        Some(Utc.with_ymd_and_hms(2020, 11, 11, 19, 6, 9).unwrap() + chrono::Duration::milliseconds(215))
    );
    assert_eq!(record.severity, Some(SeverityValue::Canonical(Severity::Warning)));
    assert_eq!(record.fields["component"], json!("NETWORK"));
    assert_eq!(record.fields["context"], json!("conn1"));
    assert_eq!(record.message(), Some("Connection ended"));
    assert!(record.get("t").is_none());
    assert!(record.fields.keys().all(|key| !key.starts_with("temp_")));
}

#[test]
fn test_rename_pair_restores_record() {
    let mut record = pipeline(&adapter(true)).normalize("2024-01-01 00:00:00 INFO [main] started").record;
    let original = record.clone();

    apply_renames(&mut record, &[Rename::soft("thread", "worker")]);
    assert_eq!(record.fields["worker"], json!("main"));
    apply_renames(&mut record, &[Rename::soft("worker", "thread")]);

    assert_eq!(record.fields.get("thread"), original.fields.get("thread"));
    assert!(record.get("worker").is_none());
}

#[quickcheck]
fn prop_streams_emit_one_record_per_begin_line(continuations: Vec<u8>) -> bool {
    // each entry is the number of continuation lines after one begin line
    let mut lines = Vec::new();
    for (i, count) in continuations.iter().enumerate() {
        lines.push(format!("2024-01-01 00:00:{:02} INFO record {}", i % 60, i));
        for j in 0..(*count % 4) {
            lines.push(format!("  detail {}", j));
        }
    }

    let results = normalize_lines(pipeline(&adapter(true)), lines.iter().map(String::as_str));
    results.len() == continuations.len()
        && results
            .iter()
            .zip(&continuations)
            .all(|(result, count)| result.record.raw.lines().count() == 1 + (*count % 4) as usize)
}
