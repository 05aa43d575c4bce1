//! Structured, timestamped record of provider traffic.
//!
//! Every request, retry, success and failure of a batch is appended here
//! and mirrored to `tracing`. The log is shared by all batches of a session
//! behind one mutex; appending never fails the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// What happened to a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogEvent {
    Request,
    Retry,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub event: LogEvent,
    /// Provider code of the batch's target language
    pub language: String,
    /// Backoff scheduled before the next attempt, for `Retry` entries
    pub delay_ms: Option<u64>,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {:?} {}: {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.level,
            self.event,
            self.language,
            self.message
        )
    }
}

/// Cheaply cloneable handle to a session's log
#[derive(Debug, Clone, Default)]
pub struct TranslationLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TranslationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: LogLevel, event: LogEvent, language: &str, delay: Option<Duration>, message: String) {
        match level {
            LogLevel::Info => info!(language, "{:?}: {}", event, message),
            LogLevel::Warning => warn!(language, "{:?}: {}", event, message),
            LogLevel::Error => error!(language, "{:?}: {}", event, message),
        }
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            event,
            language: language.to_string(),
            delay_ms: delay.map(|d| d.as_millis() as u64),
            message,
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    pub fn request(&self, language: &str, message: String) {
        self.push(LogLevel::Info, LogEvent::Request, language, None, message);
    }

    pub fn retry(&self, language: &str, delay: Duration, message: String) {
        self.push(LogLevel::Warning, LogEvent::Retry, language, Some(delay), message);
    }

    pub fn success(&self, language: &str, message: String) {
        self.push(LogLevel::Info, LogEvent::Success, language, None, message);
    }

    pub fn failure(&self, language: &str, message: String) {
        self.push(LogLevel::Error, LogEvent::Failure, language, None, message);
    }

    /// Snapshot of all entries so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Entries of one kind, in append order
    pub fn events(&self, event: LogEvent) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.event == event)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
