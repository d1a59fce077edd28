use crate::error::{ConfigError, ParseError};
use crate::extractor::ParserList;
use crate::models::LogRecord;
use crate::parsers::ParserConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Dotted field path such as `t.$date`: the object at `parent` holds `leaf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    parent: Vec<String>,
    leaf: String,
}

impl FieldPath {
    pub fn parse(path: &str) -> Option<FieldPath> {
        let mut segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return None;
        }
        let leaf = segments.pop()?;
        Some(FieldPath {
            parent: segments,
            leaf,
        })
    }

    pub fn parent(&self) -> &[String] {
        &self.parent
    }

    pub fn leaf(&self) -> &str {
        &self.leaf
    }
}

/// How to bring one nested value to the top level of a record, as written in
/// configuration.
///
/// Every key of the object holding `source` is lifted under `prefix`, the
/// lifted source becomes `destination`, and `reparse` (if any) runs against
/// the destination's text. Leftover lifted keys are re-nested under
/// `nest_remaining` or removed by `discard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionSpec {
    pub source: String,
    #[serde(default)]
    pub prefix: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reparse: Vec<ParserConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nest_remaining: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discard: Vec<String>,
}

impl PromotionSpec {
    /// Lift `source` to `destination` with a temporary prefix derived from the
    /// source's parent path; every key carrying that prefix is discarded afterwards.
    pub fn lift(source: &str, destination: &str) -> Self {
        let parent: Vec<&str> = source.split('.').collect();
        let parent = &parent[..parent.len().saturating_sub(1)];
        let prefix = format!("temp_{}_", parent.join("_"));
        Self {
            source: source.to_string(),
            discard: vec![format!("{}*", prefix)],
            prefix,
            destination: destination.to_string(),
            reparse: Vec::new(),
            nest_remaining: None,
        }
    }

    /// Replace the temporary prefix, keeping the discard wildcard in step
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let old_wildcard = format!("{}*", self.prefix);
        for pattern in &mut self.discard {
            if *pattern == old_wildcard {
                *pattern = format!("{}*", prefix);
            }
        }
        self.prefix = prefix.to_string();
        self
    }

    pub fn reparse_with(mut self, parsers: Vec<ParserConfig>) -> Self {
        self.reparse = parsers;
        self
    }

    pub fn nest_remaining(mut self, target: &str) -> Self {
        self.nest_remaining = Some(target.to_string());
        self
    }

    pub fn discard(mut self, pattern: &str) -> Self {
        self.discard.push(pattern.to_string());
        self
    }
}

/// Compiled [`PromotionSpec`]
#[derive(Debug, Clone)]
pub struct NestedPromoter {
    path: FieldPath,
    prefix: String,
    destination: String,
    reparse: ParserList,
    nest_remaining: Option<String>,
    discard: Vec<String>,
}

impl NestedPromoter {
    pub fn new(spec: &PromotionSpec) -> Result<Self, ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidPromotion {
            source_path: spec.source.clone(),
            error_message: message.to_string(),
        };

        let path = FieldPath::parse(&spec.source).ok_or_else(|| invalid("empty path segment"))?;
        if spec.destination.is_empty() {
            return Err(invalid("destination is empty"));
        }
        if !path.parent().is_empty() && spec.prefix.is_empty() {
            return Err(invalid("lifting a nested object needs a temporary prefix"));
        }
        if spec.nest_remaining.as_deref() == Some("") {
            return Err(invalid("nest_remaining target is empty"));
        }

        Ok(Self {
            path,
            prefix: spec.prefix.clone(),
            destination: spec.destination.clone(),
            reparse: ParserList::from_configs(&spec.reparse)?,
            nest_remaining: spec.nest_remaining.clone(),
            discard: spec.discard.clone(),
        })
    }

    pub fn promote(&self, record: LogRecord) -> LogRecord {
        let mut warnings = Vec::new();
        self.promote_collecting(record, &mut warnings)
    }

    /// Same as [`promote`](Self::promote), appending re-parse warnings to `warnings`
    pub fn promote_collecting(&self, mut record: LogRecord, warnings: &mut Vec<ParseError>) -> LogRecord {
        if !self.lift(&mut record) {
            return record;
        }

        if !self.reparse.is_empty() && record.get(&self.destination).is_some_and(Value::is_string) {
            let parse_status = record.parse_status;
            let result = self.reparse.extract_field(record, &self.destination);
            warnings.extend(result.warnings);
            record = result.record;
            record.parse_status = parse_status;
        }

        if let Some(target) = &self.nest_remaining {
            self.renest(&mut record, target);
        }

        for pattern in &self.discard {
            discard_matching(&mut record.fields, pattern);
        }
        record
    }

    /// Steps the source out of its parent. Returns false when there is nothing to lift.
    fn lift(&self, record: &mut LogRecord) -> bool {
        let Some((first, rest)) = self.path.parent().split_first() else {
            // top-level source: plain hard rename
            return match record.remove(self.path.leaf()) {
                Some(value) => {
                    record.fields.insert(self.destination.clone(), value);
                    true
                }
                None => false,
            };
        };

        let Some(object) = take_object(&mut record.fields, first, rest) else {
            return false;
        };

        let mut destination_value = None;
        for (key, value) in object {
            if key == self.path.leaf() {
                destination_value = Some(value);
            } else {
                record.fields.insert(format!("{}{}", self.prefix, key), value);
            }
        }
        if let Some(value) = destination_value {
            record.fields.insert(self.destination.clone(), value);
        }
        true
    }

    fn renest(&self, record: &mut LogRecord, target: &str) {
        let lifted: Vec<String> = record
            .fields
            .keys()
            .filter(|key| key.starts_with(&self.prefix))
            .cloned()
            .collect();
        if lifted.is_empty() {
            return;
        }

        let mut nested = Map::new();
        for key in lifted {
            if let Some(value) = record.remove(&key) {
                nested.insert(key[self.prefix.len()..].to_string(), value);
            }
        }
        match record.fields.get_mut(target) {
            Some(Value::Object(existing)) => existing.extend(nested),
            _ => {
                record.fields.insert(target.to_string(), Value::Object(nested));
            }
        }
    }
}

/// Remove the object at `first.rest..` from `fields`; non-objects are left in place
fn take_object(fields: &mut Map<String, Value>, first: &str, rest: &[String]) -> Option<Map<String, Value>> {
    match rest.split_first() {
        None => {
            if !fields.get(first)?.is_object() {
                return None;
            }
            match fields.shift_remove(first)? {
                Value::Object(object) => Some(object),
                _ => None,
            }
        }
        Some((next, rest)) => take_object(fields.get_mut(first)?.as_object_mut()?, next, rest),
    }
}

fn discard_matching(fields: &mut Map<String, Value>, pattern: &str) {
    match pattern.strip_suffix('*') {
        Some(prefix) => fields.retain(|key, _| !key.starts_with(prefix)),
        None => {
            fields.shift_remove(pattern);
        }
    }
}

/// Run `promoter` over `record`; free-function form of [`NestedPromoter::promote`]
pub fn promote(record: LogRecord, promoter: &NestedPromoter) -> LogRecord {
    promoter.promote(record)
}
