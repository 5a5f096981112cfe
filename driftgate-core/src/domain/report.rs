// driftgate-core/src/domain/report.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::verdict::Verdict;

/// Lines shown by the notification sender before truncating.
pub const DEFAULT_DISPLAY_LIMIT: usize = 15;

/// `{"failures": [string, ...]}`: the only hand-off to the notification sender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub failures: Vec<String>,
}

impl FailureReport {
    /// One line per anomalous verdict, in evaluation order.
    pub fn from_verdicts<'a, I>(verdicts: I) -> Self
    where
        I: IntoIterator<Item = &'a Verdict>,
    {
        Self {
            failures: verdicts
                .into_iter()
                .filter(|v| v.has_anomaly)
                .map(Verdict::failure_line)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Bullet lines, capped at `limit` with a "(+N more omitted)" marker.
    pub fn bullets(&self, limit: usize) -> Vec<String> {
        let mut lines: Vec<String> = self
            .failures
            .iter()
            .take(limit)
            .map(|f| format!("• {}", f))
            .collect();
        if self.failures.len() > limit {
            lines.push(format!("(+{} more omitted)", self.failures.len() - limit));
        }
        lines
    }
}

/// A failures file as read by a consumer, classified once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureFile {
    /// JSON: `{"failures": [...]}` or a top-level array.
    Structured(Vec<String>),
    /// Plain text, one failure per non-blank line.
    RawLines(Vec<String>),
    ParseError(String),
}

impl FailureFile {
    pub fn parse(content: &str) -> Self {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return FailureFile::ParseError("failures file is empty".to_string());
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(mut map)) => match map.remove("failures") {
                Some(Value::Array(items)) => FailureFile::Structured(stringify(items)),
                Some(_) => FailureFile::ParseError("'failures' is not a list".to_string()),
                None => FailureFile::ParseError("JSON object has no 'failures' key".to_string()),
            },
            Ok(Value::Array(items)) => FailureFile::Structured(stringify(items)),
            Ok(other) => FailureFile::ParseError(format!("unrecognized JSON value: {}", other)),
            // Looks like JSON but is not: report it, do not read it as text
            Err(e) if trimmed.starts_with('{') || trimmed.starts_with('[') => {
                FailureFile::ParseError(format!("invalid JSON: {}", e))
            }
            Err(_) => FailureFile::RawLines(
                trimmed
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }

    pub fn into_report(self) -> Result<FailureReport, String> {
        match self {
            FailureFile::Structured(failures) | FailureFile::RawLines(failures) => {
                Ok(FailureReport { failures })
            }
            FailureFile::ParseError(message) => Err(message),
        }
    }
}

fn stringify(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect()
}
