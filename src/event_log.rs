//! Operational event log.
//!
//! Append-only, timestamped trace of what the session did, kept newest first
//! for the presentation layer. Every record is mirrored to the `log` facade.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl LogLevel {
    fn label(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Loggable payloads.
///
/// Only text passes through untouched. Anything else is described and
/// forced to `Error` so the log never has to print a raw value.
#[derive(Debug, Clone)]
pub enum LogPayload {
    Text(String),
    Json(serde_json::Value),
    Fault(String),
}

impl LogPayload {
    /// Wrap an error value.
    pub fn fault(err: &dyn std::error::Error) -> Self {
        LogPayload::Fault(err.to_string())
    }

    /// Render to text, reporting whether the payload was non-textual.
    fn resolve(self) -> (String, bool) {
        match self {
            LogPayload::Text(text) => (text, false),
            LogPayload::Json(serde_json::Value::String(text)) => (text, false),
            LogPayload::Json(value) => {
                (format!("non-text {} payload: {}", json_shape(&value), value), true)
            }
            LogPayload::Fault(description) => (format!("fault: {}", description), true),
        }
    }
}

impl From<&str> for LogPayload {
    fn from(text: &str) -> Self {
        LogPayload::Text(text.to_string())
    }
}

impl From<String> for LogPayload {
    fn from(text: String) -> Self {
        LogPayload::Text(text)
    }
}

impl From<serde_json::Value> for LogPayload {
    fn from(value: serde_json::Value) -> Self {
        LogPayload::Json(value)
    }
}

/// One stored log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Wall clock `MM:SS:mmm`
    pub timestamp: String,
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[[{:<5}]] {} : {}", self.level.label(), self.timestamp, self.text)
    }
}

/// Shared handle to the session's event log.
///
/// Cloning is cheap; all clones append to the same record.
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at `level`, upgraded to `Error` when the text says
    /// "failed" or "error", or when the payload is not text.
    pub fn record(&self, payload: impl Into<LogPayload>, level: LogLevel) {
        let (text, forced) = payload.into().resolve();
        let level = classify(&text, level, forced);

        match level {
            LogLevel::Info => log::info!("{}", text),
            LogLevel::Error => log::error!("{}", text),
        }

        let entry = LogEntry {
            level,
            timestamp: formatted_now(),
            text,
        };
        self.entries.lock().push_front(entry);
    }

    pub fn info(&self, payload: impl Into<LogPayload>) {
        self.record(payload, LogLevel::Info);
    }

    pub fn error(&self, payload: impl Into<LogPayload>) {
        self.record(payload, LogLevel::Error);
    }

    /// Snapshot of all entries, newest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// True if any error entry contains `needle`
    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|e| e.level == LogLevel::Error && e.text.contains(needle))
    }
}

fn classify(text: &str, requested: LogLevel, forced: bool) -> LogLevel {
    if forced || requested == LogLevel::Error || text.contains("failed") || text.contains("error") {
        LogLevel::Error
    } else {
        LogLevel::Info
    }
}

fn json_shape(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn formatted_now() -> String {
    Local::now().format("%M:%S:%3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_text_upgrades_to_error() {
        let log = EventLog::new();
        log.info("upload failed");
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Error);
        assert_eq!(entries[0].text, "upload failed");
    }

    #[test]
    fn test_severity_match_is_case_sensitive() {
        let log = EventLog::new();
        log.info("Upload FAILED with Error");
        assert_eq!(log.entries()[0].level, LogLevel::Info);
    }

    #[test]
    fn test_newest_entry_first() {
        let log = EventLog::new();
        log.info("first");
        log.info("second");
        log.info("third");
        let texts: Vec<_> = log.entries().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_non_text_payload_is_wrapped() {
        let log = EventLog::new();
        log.info(serde_json::json!({ "candidate": 1 }));
        let entry = &log.entries()[0];
        assert_eq!(entry.level, LogLevel::Error);
        assert!(entry.text.starts_with("non-text object payload"));
        assert!(entry.text.contains("\"candidate\":1"));

        log.info(serde_json::json!("plain words"));
        let entry = &log.entries()[0];
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.text, "plain words");
    }

    #[test]
    fn test_fault_payload_is_error() {
        let log = EventLog::new();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "socket gone");
        log.info(LogPayload::fault(&err));
        assert!(log.has_error_containing("socket gone"));
    }

    #[test]
    fn test_timestamp_format() {
        let log = EventLog::new();
        log.info("tick");
        let stamp = log.entries()[0].timestamp.clone();
        let parts: Vec<_> = stamp.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 2);
        assert_eq!(parts[2].len(), 3);
        assert!(parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn test_entry_display() {
        let entry = LogEntry {
            level: LogLevel::Info,
            timestamp: "04:05:006".to_string(),
            text: "hello".to_string(),
        };
        assert_eq!(entry.to_string(), "[[INFO ]] 04:05:006 : hello");
    }

    #[test]
    fn test_clones_share_entries() {
        let log = EventLog::new();
        let other = log.clone();
        other.info("from clone");
        assert_eq!(log.len(), 1);
    }
}
