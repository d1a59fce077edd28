use crate::cli::OutputFormat;
use crate::models::{LogRecord, ParseStatus, Severity, SeverityValue};
use crate::parse_result::ParseResult;
use crate::statistics::{generate_report, NormalizationStatistics};
use colored::*;
use serde_json::Value;
use std::io::{self, Write};

pub struct OutputFormatter {
    format: OutputFormat,
    show_source: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_source: false,
        }
    }

    /// Prefix table rows with the stream name
    pub fn with_source(mut self, show: bool) -> Self {
        self.show_source = show;
        self
    }

    pub fn format_result(&self, result: &ParseResult, source: &str) -> String {
        match self.format {
            OutputFormat::Table => self.format_table(&result.record, source),
            OutputFormat::Json | OutputFormat::Ndjson => serde_json::to_string(&result.record).unwrap_or_default(),
        }
    }

    pub fn print_header(&self, writer: &mut impl Write) -> io::Result<()> {
        match self.format {
            OutputFormat::Table => writeln!(writer, "{}", "─".repeat(100).dimmed()),
            OutputFormat::Json => writeln!(writer, "["),
            OutputFormat::Ndjson => Ok(()),
        }
    }

    /// Write one record, `first` telling the JSON array whether it needs a separator
    pub fn write_result(
        &self,
        writer: &mut impl Write,
        result: &ParseResult,
        source: &str,
        first: bool,
    ) -> io::Result<()> {
        let line = self.format_result(result, source);
        match self.format {
            OutputFormat::Json if !first => writeln!(writer, ",  {}", line),
            OutputFormat::Json => writeln!(writer, "  {}", line),
            _ => writeln!(writer, "{}", line),
        }
    }

    pub fn print_footer(&self, writer: &mut impl Write) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => writeln!(writer, "]"),
            _ => Ok(()),
        }
    }

    fn format_table(&self, record: &LogRecord, source: &str) -> String {
        let mut output = String::new();

        if self.show_source {
            output.push_str(&format!("{} ", source.magenta()));
        }

        let ts = record
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| "-".to_string());
        if record.timestamp_fallback {
            output.push_str(&format!("{} ", ts.yellow()));
        } else {
            output.push_str(&format!("{} ", ts.cyan()));
        }

        output.push_str(&format!("[{:^8}] ", colored_severity(record.severity.as_ref())));

        match record.parse_status {
            ParseStatus::Unparsed => output.push_str(&record.raw.dimmed().to_string()),
            ParseStatus::Parsed { .. } => {
                output.push_str(record.message().unwrap_or_default());

                let fields_str: Vec<String> = record
                    .fields
                    .iter()
                    .filter(|(k, _)| k.as_str() != crate::models::MESSAGE_FIELD)
                    .map(|(k, v)| format!("{}={}", k.dimmed(), format_value(v)))
                    .collect();
                if !fields_str.is_empty() {
                    output.push_str(&format!(" {}", fields_str.join(" ").dimmed()));
                }
            }
        }

        output
    }
}

fn colored_severity(severity: Option<&SeverityValue>) -> ColoredString {
    let Some(severity) = severity else {
        return "-".dimmed();
    };
    let text = severity.as_str();
    match severity.canonical() {
        Some(Severity::Fatal) | Some(Severity::Critical) => text.red().bold(),
        Some(Severity::Error) => text.red(),
        Some(Severity::Warning) => text.yellow(),
        Some(Severity::Info) => text.green(),
        Some(Severity::Debug) => text.blue(),
        Some(Severity::Default) | None => text.normal(),
    }
}

fn format_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => v.to_string(),
    }
}

pub fn print_stats_summary(stats: &NormalizationStatistics) {
    eprintln!("\n{}", "═".repeat(50).cyan());
    eprintln!("{}", "SUMMARY".cyan().bold());
    eprintln!("{}", "═".repeat(50).cyan());
    eprint!("{}", generate_report(stats));
}
