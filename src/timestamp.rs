use crate::error::{ConfigError, ParseError};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::borrow::Cow;

/// Zone names accepted in place of a numeric offset
const UTC_ZONE_NAMES: [&str; 2] = ["UTC", "GMT"];

/// A strptime-style timestamp layout as adapters write it.
///
/// Layouts follow the collector convention: `%L` is the fractional-second
/// field of any width (after `.` or `,`), and `%z` accepts `Z`, `+hh:mm`,
/// `+hhmm` and the `UTC`/`GMT` zone names. Everything else is passed to
/// chrono unchanged. Layouts without `%z` are read as UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLayout {
    layout: String,
    format: String,
    /// Which literal comma of the input (0-based) separates the fraction
    comma_fraction: Option<usize>,
    has_offset: bool,
}

impl TimeLayout {
    pub fn new(layout: &str) -> Result<Self, ConfigError> {
        let mut format = String::with_capacity(layout.len() + 4);
        let mut comma_fraction = None;
        let mut has_offset = false;

        let mut chars = layout.chars();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                format.push(ch);
                continue;
            }
            match chars.next() {
                Some('L') => {
                    if format.ends_with('.') {
                        format.pop();
                        format.push_str("%.f");
                    } else if format.ends_with(',') {
                        format.pop();
                        comma_fraction = Some(format.matches(',').count());
                        format.push_str("%.f");
                    } else {
                        format.push_str("%3f");
                    }
                }
                Some('z') => {
                    has_offset = true;
                    format.push_str("%#z");
                }
                Some(other) => {
                    format.push('%');
                    format.push(other);
                }
                None => {
                    return Err(ConfigError::InvalidTimeLayout {
                        layout: layout.to_string(),
                        error_message: "dangling '%' at end of layout".to_string(),
                    });
                }
            }
        }

        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidTimeLayout {
                layout: layout.to_string(),
                error_message: format!("unsupported specifier in '{}'", format),
            });
        }

        Ok(Self {
            layout: layout.to_string(),
            format,
            comma_fraction,
            has_offset,
        })
    }

    /// The layout as it was written in the adapter configuration
    pub fn as_str(&self) -> &str {
        &self.layout
    }

    pub fn parse(&self, input: &str) -> Result<DateTime<Utc>, ParseError> {
        let text = self.normalize_input(input.trim());

        let parsed = if self.has_offset {
            DateTime::parse_from_str(&text, &self.format)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        } else {
            NaiveDateTime::parse_from_str(&text, &self.format)
                .ok()
                .map(|naive| naive.and_utc())
        };

        parsed.ok_or_else(|| ParseError::TimestampParseError {
            input: input.to_string(),
            layout: self.layout.clone(),
        })
    }

    fn normalize_input<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut text = Cow::Borrowed(input);
        if let Some(nth) = self.comma_fraction {
            if let Some((index, _)) = input.match_indices(',').nth(nth) {
                text = Cow::Owned(format!("{}.{}", &input[..index], &input[index + 1..]));
            }
        }
        if self.has_offset {
            for zone in UTC_ZONE_NAMES {
                if let Some(prefix) = text.strip_suffix(zone) {
                    text = Cow::Owned(format!("{}+00:00", prefix));
                    break;
                }
            }
        }
        text
    }
}
