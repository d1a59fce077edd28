use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the state every rule set starts in
pub const START_STATE: &str = "start_state";

/// One transition of the multiline state machine, as written in configuration.
///
/// `regex` is tested against each incoming line while the aggregator is in
/// `state_name`. Continuation rules are usually the negation of the begin
/// rule; write them with `negate: true`, or in the `^(?!X)` / `^(?!X).*`
/// notation, which is read as "does not match `^X`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultilineRule {
    pub state_name: String,
    pub regex: String,
    pub next_state: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub negate: bool,
}

impl MultilineRule {
    pub fn new(state_name: &str, regex: &str, next_state: &str) -> Self {
        Self {
            state_name: state_name.to_string(),
            regex: regex.to_string(),
            next_state: next_state.to_string(),
            negate: false,
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// The usual rule pair: a record begins with a line matching `^begin`, and
    /// every line that does not is a continuation.
    pub fn timestamp_anchored(begin: &str) -> Vec<MultilineRule> {
        let anchored = if begin.starts_with('^') {
            begin.to_string()
        } else {
            format!("^{}", begin)
        };
        vec![
            MultilineRule::new(START_STATE, &anchored, "cont"),
            MultilineRule::new("cont", &anchored, "cont").negated(),
        ]
    }
}

/// Rewrite `^(?!X)` and `^(?!X).*` into (`^X`, negated). The regex engine has
/// no lookaround, and for a whole-line predicate the two are equivalent.
/// Anything else after the group keeps the pattern as written.
fn split_negative_lookahead(pattern: &str) -> Option<String> {
    let body = pattern.strip_prefix("^(?!")?;
    let close = closing_paren(body)?;
    match &body[close + 1..] {
        "" | ".*" => Some(format!("^(?:{})", &body[..close])),
        _ => None,
    }
}

/// Byte offset of the `)` closing a group whose `(` precedes `body`
fn closing_paren(body: &str) -> Option<usize> {
    let mut depth = 1;
    let mut in_class = false;
    let mut chars = body.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' if !in_class => {
                in_class = true;
                // a leading `]` (after an optional `^`) is a literal
                if chars.peek().is_some_and(|&(_, next)| next == '^') {
                    chars.next();
                }
                if chars.peek().is_some_and(|&(_, next)| next == ']') {
                    chars.next();
                }
            }
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug)]
struct CompiledRule {
    regex: Regex,
    negate: bool,
    next_state: usize,
}

impl CompiledRule {
    fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line) != self.negate
    }
}

/// Validated, compiled rule set. Immutable once built and shared by every
/// aggregator of the same adapter.
#[derive(Debug)]
pub struct MultilineRules {
    state_names: Vec<String>,
    rules_by_state: Vec<Vec<CompiledRule>>,
}

const START: usize = 0;

impl MultilineRules {
    pub fn compile(rules: &[MultilineRule]) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidMultilineRules {
            error_message: message,
        };

        let mut state_names = vec![START_STATE.to_string()];
        for rule in rules {
            if !state_names.contains(&rule.state_name) {
                state_names.push(rule.state_name.clone());
            }
        }
        let index_of = |name: &str| state_names.iter().position(|s| s == name);

        let mut rules_by_state: Vec<Vec<CompiledRule>> = state_names.iter().map(|_| Vec::new()).collect();
        for rule in rules {
            let next_state = index_of(&rule.next_state).ok_or_else(|| {
                invalid(format!(
                    "rule in state '{}' moves to '{}', which has no rules",
                    rule.state_name, rule.next_state
                ))
            })?;
            if next_state == START {
                return Err(invalid(format!(
                    "rule in state '{}' moves back to '{}'; records must continue in a continuation state",
                    rule.state_name, START_STATE
                )));
            }

            let (pattern, negate) = match split_negative_lookahead(&rule.regex) {
                Some(positive) => (positive, !rule.negate),
                None => (rule.regex.clone(), rule.negate),
            };
            let regex = Regex::new(&pattern).map_err(|e| ConfigError::RegexError {
                pattern: rule.regex.clone(),
                error_message: e.to_string(),
            })?;

            let state = index_of(&rule.state_name).unwrap_or(START);
            rules_by_state[state].push(CompiledRule {
                regex,
                negate,
                next_state,
            });
        }

        if rules_by_state[START].is_empty() {
            return Err(invalid(format!("no rule for '{}'", START_STATE)));
        }
        if state_names.len() < 2 {
            return Err(invalid("no continuation state".to_string()));
        }

        Ok(Self {
            state_names,
            rules_by_state,
        })
    }

    fn find(&self, state: usize, line: &str) -> Option<&CompiledRule> {
        self.rules_by_state[state].iter().find(|rule| rule.matches(line))
    }

    /// Continuation state entered when a record is begun without a begin match
    fn default_continuation(&self) -> usize {
        self.rules_by_state[START]
            .first()
            .map(|rule| rule.next_state)
            .unwrap_or(START)
    }

    pub fn state_name(&self, state: usize) -> &str {
        &self.state_names[state]
    }
}

/// Per-stream line buffer driven by a [`MultilineRules`] state machine.
///
/// Lines are fed strictly in arrival order; a completed record is returned
/// when the next record's first line arrives, or on [`flush`](Self::flush).
#[derive(Debug)]
pub struct MultilineAggregator {
    rules: Arc<MultilineRules>,
    state: usize,
    buffer: String,
    buffered_lines: usize,
    max_lines: Option<usize>,
}

impl MultilineAggregator {
    pub fn new(rules: Arc<MultilineRules>) -> Self {
        Self {
            rules,
            state: START,
            buffer: String::new(),
            buffered_lines: 0,
            max_lines: None,
        }
    }

    /// Cap the number of lines one record may span
    pub fn with_max_lines(mut self, max_lines: Option<usize>) -> Self {
        self.max_lines = max_lines.filter(|&n| n > 0);
        self
    }

    /// Offer the next line; returns the previous record if this line completed it
    pub fn feed(&mut self, line: &str) -> Option<String> {
        if self.state != START {
            if let Some(rule) = self.rules.find(self.state, line) {
                let next_state = rule.next_state;
                let flushed = self.append(line);
                self.state = next_state;
                return flushed;
            }
        }

        if let Some(rule) = self.rules.find(START, line) {
            let next_state = rule.next_state;
            let flushed = self.take_buffer();
            self.begin(line);
            self.state = next_state;
            tracing::trace!(state = %self.rules.state_name(next_state), "multiline: record begins");
            return flushed;
        }

        if self.buffered_lines == 0 {
            // nothing to continue: the line starts a record on its own
            self.begin(line);
            self.state = self.rules.default_continuation();
            return None;
        }

        self.append(line)
    }

    /// Emit whatever is buffered; used at end of stream
    pub fn flush(&mut self) -> Option<String> {
        let flushed = self.take_buffer();
        self.state = START;
        flushed
    }

    pub fn has_pending(&self) -> bool {
        self.buffered_lines > 0
    }

    pub fn state_name(&self) -> &str {
        self.rules.state_name(self.state)
    }

    fn begin(&mut self, line: &str) {
        self.buffer.push_str(line);
        self.buffered_lines = 1;
    }

    fn append(&mut self, line: &str) -> Option<String> {
        if let Some(max_lines) = self.max_lines {
            if self.buffered_lines >= max_lines {
                tracing::debug!(max_lines, "multiline: max_lines reached, flushing");
                let flushed = self.take_buffer();
                self.begin(line);
                return flushed;
            }
        }
        self.buffer.push('\n');
        self.buffer.push_str(line);
        self.buffered_lines += 1;
        None
    }

    fn take_buffer(&mut self) -> Option<String> {
        if self.buffered_lines == 0 {
            return None;
        }
        self.buffered_lines = 0;
        Some(std::mem::take(&mut self.buffer))
    }
}
