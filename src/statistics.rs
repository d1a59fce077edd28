use crate::error::ParseError;
use crate::parse_result::ParseResult;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Normalization statistics for monitoring and debugging
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStatistics {
    /// Physical input lines consumed
    pub total_lines: usize,
    /// Records emitted, after multiline joining
    pub total_records: usize,
    pub parsed_records: usize,
    /// Records no parser matched
    pub unparsed_records: usize,
    pub coercion_failures: usize,
    pub timestamp_fallbacks: usize,
    /// Records per winning parser position
    pub parser_distribution: BTreeMap<usize, usize>,
    /// Records per severity; records without one count as "NONE"
    pub severity_distribution: BTreeMap<String, usize>,
    /// Warnings by kind
    pub warning_distribution: HashMap<String, usize>,
    /// Processing time statistics (in microseconds)
    pub processing_time_micros: ProcessingTimeStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingTimeStats {
    pub total_time: u64,
    pub min_time: u64,
    pub max_time: u64,
    pub avg_time: f64,
}

impl NormalizationStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_lines(&mut self, lines: usize) {
        self.total_lines += lines;
    }

    /// Account for one normalized record
    pub fn record(&mut self, result: &ParseResult) {
        self.total_records += 1;
        match result.parser_index() {
            Some(index) => {
                self.parsed_records += 1;
                *self.parser_distribution.entry(index).or_insert(0) += 1;
            }
            None => self.unparsed_records += 1,
        }

        let severity = result
            .record
            .severity
            .as_ref()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "NONE".to_string());
        *self.severity_distribution.entry(severity).or_insert(0) += 1;

        if result.record.timestamp_fallback {
            self.timestamp_fallbacks += 1;
        }
        for warning in &result.warnings {
            if matches!(warning, ParseError::FieldCoercionError { .. }) {
                self.coercion_failures += 1;
            }
            *self.warning_distribution.entry(warning.kind().to_string()).or_insert(0) += 1;
        }

        self.update_processing_time(result.processing_time_micros.unwrap_or(0));
    }

    /// Fold another stream's statistics into these
    pub fn merge(&mut self, other: &NormalizationStatistics) {
        self.total_lines += other.total_lines;
        self.total_records += other.total_records;
        self.parsed_records += other.parsed_records;
        self.unparsed_records += other.unparsed_records;
        self.coercion_failures += other.coercion_failures;
        self.timestamp_fallbacks += other.timestamp_fallbacks;
        for (index, count) in &other.parser_distribution {
            *self.parser_distribution.entry(*index).or_insert(0) += count;
        }
        for (severity, count) in &other.severity_distribution {
            *self.severity_distribution.entry(severity.clone()).or_insert(0) += count;
        }
        for (kind, count) in &other.warning_distribution {
            *self.warning_distribution.entry(kind.clone()).or_insert(0) += count;
        }

        let times = &mut self.processing_time_micros;
        let other_times = &other.processing_time_micros;
        times.total_time = times.total_time.saturating_add(other_times.total_time);
        if other.total_records > 0 {
            if times.min_time == 0 || (other_times.min_time > 0 && other_times.min_time < times.min_time) {
                times.min_time = other_times.min_time;
            }
            times.max_time = times.max_time.max(other_times.max_time);
        }
        times.avg_time = if self.total_records == 0 {
            0.0
        } else {
            times.total_time as f64 / self.total_records as f64
        };
    }

    /// Share of records some parser matched, as a percentage
    pub fn parse_rate(&self) -> f64 {
        self.percentage(self.parsed_records)
    }

    pub fn unparsed_rate(&self) -> f64 {
        self.percentage(self.unparsed_records)
    }

    pub fn timestamp_fallback_rate(&self) -> f64 {
        self.percentage(self.timestamp_fallbacks)
    }

    fn percentage(&self, count: usize) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (count as f64 / self.total_records as f64) * 100.0
        }
    }

    fn update_processing_time(&mut self, time_micros: u64) {
        let times = &mut self.processing_time_micros;
        times.total_time = times.total_time.saturating_add(time_micros);

        if times.min_time == 0 || time_micros < times.min_time {
            times.min_time = time_micros;
        }
        if time_micros > times.max_time {
            times.max_time = time_micros;
        }

        times.avg_time = times.total_time as f64 / self.total_records as f64;
    }
}

/// Statistics monitor: accumulates statistics and emits a status line
/// through `tracing` every `report_interval` records.
#[derive(Debug, Clone)]
pub struct StatisticsMonitor {
    stats: NormalizationStatistics,
    monitoring_enabled: bool,
    report_interval: usize,
    last_report_record: usize,
    reports_emitted: usize,
}

impl StatisticsMonitor {
    pub fn new() -> Self {
        Self::with_settings(false, 1000)
    }

    pub fn with_settings(monitoring_enabled: bool, report_interval: usize) -> Self {
        Self {
            stats: NormalizationStatistics::new(),
            monitoring_enabled,
            report_interval: report_interval.max(1),
            last_report_record: 0,
            reports_emitted: 0,
        }
    }

    pub fn set_monitoring_enabled(&mut self, enabled: bool) {
        self.monitoring_enabled = enabled;
    }

    pub fn is_monitoring_enabled(&self) -> bool {
        self.monitoring_enabled
    }

    pub fn report_interval(&self) -> usize {
        self.report_interval
    }

    /// Periodic reports logged so far
    pub fn reports_emitted(&self) -> usize {
        self.reports_emitted
    }

    pub fn record(&mut self, result: &ParseResult) {
        self.stats.record(result);
        if let Some(description) = result.detailed_warning_description() {
            tracing::trace!(warnings = %description, "record warnings");
        }
        self.check_and_report();
    }

    pub fn record_lines(&mut self, lines: usize) {
        self.stats.record_lines(lines);
    }

    pub fn get_statistics(&self) -> &NormalizationStatistics {
        &self.stats
    }

    pub fn into_statistics(self) -> NormalizationStatistics {
        self.stats
    }

    pub fn reset(&mut self) {
        self.stats = NormalizationStatistics::new();
        self.last_report_record = 0;
    }

    /// Multi-section human-readable report
    pub fn generate_report(&self) -> String {
        generate_report(&self.stats)
    }

    /// Compact status line for continuous monitoring
    pub fn generate_status_line(&self) -> String {
        let stats = &self.stats;
        format!(
            "Records: {} | Lines: {} | Parsed: {:.1}% | Unparsed: {:.1}% | Time fallbacks: {:.1}% | Avg Time: {:.1}μs",
            stats.total_records,
            stats.total_lines,
            stats.parse_rate(),
            stats.unparsed_rate(),
            stats.timestamp_fallback_rate(),
            stats.processing_time_micros.avg_time
        )
    }

    fn check_and_report(&mut self) {
        if !self.monitoring_enabled {
            return;
        }

        let records_since_last_report = self.stats.total_records - self.last_report_record;
        if records_since_last_report >= self.report_interval {
            tracing::info!(
                records = self.stats.total_records,
                parsed = self.stats.parsed_records,
                unparsed = self.stats.unparsed_records,
                "{}",
                self.generate_status_line()
            );
            self.last_report_record = self.stats.total_records;
            self.reports_emitted += 1;
        }
    }
}

impl Default for StatisticsMonitor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn generate_report(stats: &NormalizationStatistics) -> String {
    let mut report = String::new();

    report.push_str("=== Normalization Statistics Report ===\n");
    report.push_str(&format!("Lines read: {}\n", stats.total_lines));
    report.push_str(&format!("Records emitted: {}\n", stats.total_records));
    report.push_str(&format!("Parsed: {} ({:.2}%)\n", stats.parsed_records, stats.parse_rate()));
    report.push_str(&format!("Unparsed: {} ({:.2}%)\n", stats.unparsed_records, stats.unparsed_rate()));
    report.push_str(&format!(
        "Timestamp fallbacks: {} ({:.2}%)\n",
        stats.timestamp_fallbacks,
        stats.timestamp_fallback_rate()
    ));
    report.push_str(&format!("Coercion failures: {}\n", stats.coercion_failures));

    report.push_str("\n--- Parser Distribution ---\n");
    for (index, count) in &stats.parser_distribution {
        report.push_str(&format!("parser {}: {}\n", index, count));
    }

    report.push_str("\n--- Severity Distribution ---\n");
    for (severity, count) in &stats.severity_distribution {
        report.push_str(&format!("{}: {}\n", severity, count));
    }

    if !stats.warning_distribution.is_empty() {
        report.push_str("\n--- Warning Distribution ---\n");
        let mut warnings: Vec<_> = stats.warning_distribution.iter().collect();
        warnings.sort();
        for (kind, count) in warnings {
            report.push_str(&format!("{}: {}\n", kind, count));
        }
    }

    report.push_str("\n--- Performance Metrics ---\n");
    report.push_str(&format!("Total processing time: {}μs\n", stats.processing_time_micros.total_time));
    report.push_str(&format!("Average processing time: {:.2}μs\n", stats.processing_time_micros.avg_time));
    report.push_str(&format!("Min processing time: {}μs\n", stats.processing_time_micros.min_time));
    report.push_str(&format!("Max processing time: {}μs\n", stats.processing_time_micros.max_time));

    report
}

/// Statistics shared by parallel streams
#[derive(Debug, Clone, Default)]
pub struct SharedStatistics {
    inner: Arc<Mutex<NormalizationStatistics>>,
}

impl SharedStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: &ParseResult) {
        self.inner.lock().record(result);
    }

    pub fn record_lines(&self, lines: usize) {
        self.inner.lock().record_lines(lines);
    }

    /// Fold a finished stream's statistics in one lock acquisition
    pub fn merge(&self, stats: &NormalizationStatistics) {
        self.inner.lock().merge(stats);
    }

    pub fn snapshot(&self) -> NormalizationStatistics {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogRecord, ParseStatus, Severity, SeverityValue};
    use quickcheck_macros::quickcheck;

    fn parsed(index: usize, severity: Option<Severity>, micros: u64) -> ParseResult {
        let mut record = LogRecord::unparsed("m");
        record.parse_status = ParseStatus::Parsed { parser_index: index };
        record.severity = severity.map(SeverityValue::Canonical);
        ParseResult::new(record, Vec::new()).with_processing_time(micros)
    }

    fn unparsed(micros: u64) -> ParseResult {
        ParseResult::new(LogRecord::unparsed("m"), Vec::new()).with_processing_time(micros)
    }

    #[test]
    fn test_statistics_monitor_creation() {
        let monitor = StatisticsMonitor::new();
        assert_eq!(monitor.get_statistics().total_records, 0);
        assert!(!monitor.monitoring_enabled);
        assert_eq!(monitor.report_interval, 1000);
    }

    #[test]
    fn test_record_distributions() {
        let mut monitor = StatisticsMonitor::new();
        monitor.record(&parsed(0, Some(Severity::Info), 10));
        monitor.record(&parsed(1, None, 30));
        monitor.record(&unparsed(20));

        let stats = monitor.get_statistics();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.parsed_records, 2);
        assert_eq!(stats.unparsed_records, 1);
        assert_eq!(stats.parser_distribution[&0], 1);
        assert_eq!(stats.parser_distribution[&1], 1);
        assert_eq!(stats.severity_distribution["INFO"], 1);
        assert_eq!(stats.severity_distribution["NONE"], 2);
        assert_eq!(stats.processing_time_micros.min_time, 10);
        assert_eq!(stats.processing_time_micros.max_time, 30);
        assert!((stats.processing_time_micros.avg_time - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_warnings_are_counted() {
        let mut result = parsed(0, None, 1);
        result.record.timestamp_fallback = true;
        result.warnings = vec![
            ParseError::FieldCoercionError {
                field_name: "tid".to_string(),
                expected_type: "integer".to_string(),
                value: "x".to_string(),
            },
            ParseError::TimestampParseError {
                input: "bad".to_string(),
                layout: "%Y".to_string(),
            },
        ];

        let mut stats = NormalizationStatistics::new();
        stats.record(&result);
        assert_eq!(stats.coercion_failures, 1);
        assert_eq!(stats.timestamp_fallbacks, 1);
        assert_eq!(stats.warning_distribution["TimestampParseError"], 1);
    }

    #[test]
    fn test_generate_report() {
        let mut monitor = StatisticsMonitor::new();
        monitor.record_lines(4);
        monitor.record(&parsed(0, Some(Severity::Error), 5));

        let report = monitor.generate_report();
        assert!(report.contains("Lines read: 4"));
        assert!(report.contains("Records emitted: 1"));
        assert!(report.contains("ERROR: 1"));
        assert!(report.contains("Performance Metrics"));
    }

    #[test]
    fn test_status_line_and_reset() {
        let mut monitor = StatisticsMonitor::with_settings(true, 1);
        monitor.record(&parsed(0, None, 1));
        assert!(monitor.generate_status_line().contains("Parsed: 100.0%"));
        assert_eq!(monitor.last_report_record, 1);

        monitor.reset();
        assert_eq!(monitor.get_statistics(), &NormalizationStatistics::new());
    }

    #[test]
    fn test_periodic_reports_follow_interval() {
        let mut monitor = StatisticsMonitor::with_settings(true, 3);
        for _ in 0..7 {
            monitor.record(&unparsed(1));
        }
        assert_eq!(monitor.reports_emitted(), 2);

        let mut quiet = StatisticsMonitor::with_settings(false, 1);
        quiet.record(&unparsed(1));
        assert_eq!(quiet.reports_emitted(), 0);
    }

    #[test]
    fn test_shared_statistics_across_threads() {
        let shared = SharedStatistics::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let shared = shared.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        shared.record(&unparsed(1));
                    }
                });
            }
        });
        assert_eq!(shared.snapshot().total_records, 100);
    }

    // Merging per-stream statistics equals recording everything in one place
    #[quickcheck]
    fn prop_merge_matches_single_pass(first: Vec<(u8, u16)>, second: Vec<(u8, u16)>) -> bool {
        let to_result = |(index, micros): &(u8, u16)| {
            if index % 3 == 0 {
                unparsed(*micros as u64)
            } else {
                parsed((*index % 3) as usize, Some(Severity::Info), *micros as u64)
            }
        };

        let mut single = NormalizationStatistics::new();
        let mut left = NormalizationStatistics::new();
        let mut right = NormalizationStatistics::new();
        for event in &first {
            single.record(&to_result(event));
            left.record(&to_result(event));
        }
        for event in &second {
            single.record(&to_result(event));
            right.record(&to_result(event));
        }
        left.merge(&right);

        left.total_records == single.total_records
            && left.parser_distribution == single.parser_distribution
            && left.severity_distribution == single.severity_distribution
            && left.processing_time_micros.total_time == single.processing_time_micros.total_time
            && left.processing_time_micros.max_time == single.processing_time_micros.max_time
    }
}
