use crate::models::LogRecord;
use serde::{Deserialize, Serialize};

/// Field rename applied after extraction and promotion.
///
/// A soft rename is skipped when `to` already exists; a hard rename overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hard: bool,
}

impl Rename {
    pub fn soft(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            hard: false,
        }
    }

    pub fn hard(from: &str, to: &str) -> Self {
        Self {
            hard: true,
            ..Self::soft(from, to)
        }
    }

    pub fn apply(&self, record: &mut LogRecord) {
        if self.from == self.to || !record.fields.contains_key(&self.from) {
            return;
        }
        if !self.hard && record.fields.contains_key(&self.to) {
            return;
        }
        if let Some(value) = record.remove(&self.from) {
            record.fields.insert(self.to.clone(), value);
        }
    }
}

/// Apply `renames` in order
pub fn apply_renames(record: &mut LogRecord, renames: &[Rename]) {
    for rename in renames {
        rename.apply(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use serde_json::json;

    fn record_with(keys: &[&str]) -> LogRecord {
        let mut record = LogRecord::unparsed("m");
        for (i, key) in keys.iter().enumerate() {
            record.add_field(key.to_string(), i as i64);
        }
        record
    }

    #[test]
    fn test_soft_rename_skips_existing_destination() {
        let mut record = record_with(&["c", "component"]);
        Rename::soft("c", "component").apply(&mut record);
        assert_eq!(record.fields["c"], json!(0));
        assert_eq!(record.fields["component"], json!(1));
    }

    #[test]
    fn test_hard_rename_overwrites() {
        let mut record = record_with(&["c", "component"]);
        Rename::hard("c", "component").apply(&mut record);
        assert!(record.get("c").is_none());
        assert_eq!(record.fields["component"], json!(0));
    }

    #[test]
    fn test_missing_source_is_ignored() {
        let mut record = record_with(&["a"]);
        let before = record.clone();
        Rename::hard("zzz", "a").apply(&mut record);
        assert_eq!(record, before);
    }

    #[test]
    fn test_swap_back_restores() {
        let original = record_with(&["a", "x"]);
        let mut record = original.clone();
        apply_renames(&mut record, &[Rename::soft("a", "b")]);
        apply_renames(&mut record, &[Rename::soft("b", "a")]);
        assert_eq!(record.fields, original.fields);
    }

    fn key(n: u8) -> String {
        format!("k{}", n % 4)
    }

    #[quickcheck]
    fn prop_rename_set_is_idempotent(present: Vec<u8>, pairs: Vec<(u8, u8, bool)>) -> bool {
        let mut record = LogRecord::unparsed("m");
        for n in present {
            record.add_field(key(n), n);
        }
        // a rename set never renames into a key another rename reads
        let renames: Vec<Rename> = pairs
            .into_iter()
            .map(|(from, to, hard)| Rename {
                from: key(from),
                to: format!("renamed_{}", key(to)),
                hard,
            })
            .collect();

        let mut once = record.clone();
        apply_renames(&mut once, &renames);
        let mut twice = once.clone();
        apply_renames(&mut twice, &renames);
        once == twice
    }
}
