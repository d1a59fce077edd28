use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the field that always carries the record body
pub const MESSAGE_FIELD: &str = "message";

/// Label stamped on every normalized record naming the adapter that produced it
pub const INSTRUMENTATION_SOURCE_LABEL: &str = "logging.instrumentation_source";

/// Canonical severity levels understood by the telemetry backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Default,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 7] = [
        Severity::Default,
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
        Severity::Fatal,
    ];

    /// Parse one of the canonical level names. Unlike source vocabularies this
    /// is the fixed backend enumeration, so only the exact uppercase names count.
    pub fn from_canonical(s: &str) -> Option<Severity> {
        Severity::ALL.iter().copied().find(|level| level.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Default => "DEFAULT",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity as it ends up on a normalized record: either a mapped canonical
/// level or, for non-exclusive maps, the source token passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeverityValue {
    Canonical(Severity),
    Raw(String),
}

impl SeverityValue {
    pub fn as_str(&self) -> &str {
        match self {
            SeverityValue::Canonical(level) => level.as_str(),
            SeverityValue::Raw(raw) => raw,
        }
    }

    pub fn canonical(&self) -> Option<Severity> {
        match self {
            SeverityValue::Canonical(level) => Some(*level),
            SeverityValue::Raw(_) => None,
        }
    }
}

impl fmt::Display for SeverityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared coercion for a captured field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Bool,
}

impl FieldType {
    pub fn from_name(name: &str) -> Option<FieldType> {
        match name {
            "string" => Some(FieldType::String),
            "integer" => Some(FieldType::Integer),
            "float" => Some(FieldType::Float),
            "bool" => Some(FieldType::Bool),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
        }
    }

    /// Convert captured text into a typed value. `None` means the text does not
    /// fit the type; callers keep the raw string in that case.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        match self {
            FieldType::String => Some(Value::String(raw.to_string())),
            FieldType::Integer => raw.trim().parse::<i64>().ok().map(Value::from),
            FieldType::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            FieldType::Bool => match raw.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }
}

/// Outcome of field extraction for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    /// Parsed by the parser at this position of the parser list
    Parsed { parser_index: usize },
    /// No parser matched; only the message field is set
    Unparsed,
}

/// One normalized log event.
///
/// `fields` is the structured payload in insertion order. Timestamp, severity
/// and labels live beside it, the way the telemetry backend keeps them apart
/// from the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<SeverityValue>,

    pub fields: Map<String, Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Set when a timestamp was captured but did not match its layout, so the
    /// record carries its ingestion time instead
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub timestamp_fallback: bool,

    pub parse_status: ParseStatus,

    /// Original record text, possibly spanning several lines
    #[serde(default, skip_serializing)]
    pub raw: String,
}

impl LogRecord {
    /// Record for text no parser recognized: the message is the raw text and
    /// nothing else is extracted.
    pub fn unparsed(raw: &str) -> Self {
        let mut fields = Map::new();
        fields.insert(MESSAGE_FIELD.to_string(), Value::String(raw.to_string()));
        Self {
            timestamp: None,
            severity: None,
            fields,
            labels: BTreeMap::new(),
            timestamp_fallback: false,
            parse_status: ParseStatus::Unparsed,
            raw: raw.to_string(),
        }
    }

    /// Record built from already structured fields
    pub fn from_fields(fields: Map<String, Value>, raw: &str, parse_status: ParseStatus) -> Self {
        Self {
            timestamp: None,
            severity: None,
            fields,
            labels: BTreeMap::new(),
            timestamp_fallback: false,
            parse_status,
            raw: raw.to_string(),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.fields.get(MESSAGE_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up a dotted path such as `attr.message` through nested objects
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn add_field<T: Into<Value>>(&mut self, key: String, value: T) {
        self.fields.insert(key, value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = Some(timestamp);
    }

    pub fn set_severity(&mut self, severity: SeverityValue) {
        self.severity = Some(severity);
    }

    pub fn set_label(&mut self, key: &str, value: String) {
        self.labels.insert(key.to_string(), value);
    }

    pub fn mark_timestamp_fallback(&mut self) {
        self.timestamp_fallback = true;
    }

    pub fn is_unparsed(&self) -> bool {
        self.parse_status == ParseStatus::Unparsed
    }
}

/// Text form of a scalar field value, used where a value is matched against
/// text (severity tokens, re-parse input).
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use serde_json::json;

    impl Arbitrary for Severity {
        fn arbitrary(g: &mut Gen) -> Self {
            *g.choose(&Severity::ALL).unwrap()
        }
    }

    #[quickcheck]
    fn prop_canonical_names_roundtrip(level: Severity) -> bool {
        Severity::from_canonical(level.as_str()) == Some(level)
    }

    #[quickcheck]
    fn prop_unparsed_record_keeps_raw_message(raw: String) -> bool {
        let record = LogRecord::unparsed(&raw);
        record.message() == Some(raw.as_str())
            && record.fields.len() == 1
            && record.is_unparsed()
            && record.timestamp.is_none()
            && record.severity.is_none()
    }

    #[test]
    fn test_severity_from_canonical_is_exact() {
        assert_eq!(Severity::from_canonical("WARNING"), Some(Severity::Warning));
        assert_eq!(Severity::from_canonical("warning"), None);
        assert_eq!(Severity::from_canonical("WARN"), None);
    }

    #[test]
    fn test_field_type_coercion() {
        assert_eq!(FieldType::Integer.coerce("26241"), Some(json!(26241)));
        assert_eq!(FieldType::Integer.coerce("x12"), None);
        assert_eq!(FieldType::Float.coerce("1.5"), Some(json!(1.5)));
        assert_eq!(FieldType::Bool.coerce("true"), Some(json!(true)));
        assert_eq!(FieldType::String.coerce("12"), Some(json!("12")));
        assert_eq!(FieldType::from_name("integer"), Some(FieldType::Integer));
        assert_eq!(FieldType::from_name("hex"), None);
    }

    #[test]
    fn test_get_path_walks_nested_objects() {
        let mut record = LogRecord::unparsed("x");
        record.add_field("attr".to_string(), json!({"message": {"text": "inner"}}));
        assert_eq!(record.get_path("attr.message.text"), Some(&json!("inner")));
        assert_eq!(record.get_path("attr.missing"), None);
        assert_eq!(record.get_path("message"), Some(&json!("x")));
    }

    #[test]
    fn test_record_serialization_shape() {
        let mut record = LogRecord::unparsed("hello");
        record.set_severity(SeverityValue::Canonical(Severity::Warning));
        record.set_label(INSTRUMENTATION_SOURCE_LABEL, "lognorm/test".to_string());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["severity"], json!("WARNING"));
        assert_eq!(value["fields"]["message"], json!("hello"));
        assert_eq!(value["parse_status"], json!("unparsed"));
        assert!(value.get("raw").is_none());
        assert!(value.get("timestamp_fallback").is_none());
    }

    #[test]
    fn test_raw_severity_serializes_as_plain_string() {
        let value = serde_json::to_value(SeverityValue::Raw("NOTICE".to_string())).unwrap();
        assert_eq!(value, json!("NOTICE"));
    }
}
