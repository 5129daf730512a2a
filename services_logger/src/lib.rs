//! # Logger Service
//!
//! This crate implements structured logging for worker contexts.
//!
//! ## Philosophy
//!
//! Logging is explicit and structured, not text-based or printf-style.
//! Entries are kept in memory so tests can inspect them, and entries at or
//! above the threshold are rendered as one line through the host print
//! primitive. Warnings and errors go to the error stream.

use core_types::WorkerId;
use host_api::HostApi;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("Unknown log level: {other}")),
        }
    }
}

/// A structured log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Source worker (if known)
    pub source: Option<WorkerId>,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            source: None,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Sets the source worker
    pub fn with_source(mut self, source: WorkerId) -> Self {
        self.source = Some(source);
        self
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    /// Returns the value of the first field named `key`
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Renders the entry as one output line, newline included
    pub fn render(&self) -> String {
        let mut line = format!("[{}]", self.level);
        if let Some(source) = self.source {
            line.push_str(&format!(" worker {source}"));
        }
        line.push(' ');
        line.push_str(&self.message);
        for (key, value) in &self.fields {
            line.push_str(&format!(" {key}={value}"));
        }
        line.push('\n');
        line
    }
}

/// Per-worker logger writing through the host
pub struct Logger<H: HostApi> {
    host: Arc<H>,
    source: Option<WorkerId>,
    threshold: LogLevel,
    entries: Vec<LogEntry>,
}

impl<H: HostApi> Logger<H> {
    /// Creates a logger that prints entries at `Info` and above
    pub fn new(host: Arc<H>, source: Option<WorkerId>) -> Self {
        Self {
            host,
            source,
            threshold: LogLevel::Info,
            entries: Vec::new(),
        }
    }

    /// Changes the print threshold; every entry is still recorded
    pub fn with_threshold(mut self, threshold: LogLevel) -> Self {
        self.threshold = threshold;
        self
    }

    /// Records an entry, tagging it with this logger's worker
    pub fn log(&mut self, mut entry: LogEntry) {
        if entry.source.is_none() {
            entry.source = self.source;
        }
        if entry.level >= self.threshold {
            self.host
                .print(&entry.render(), entry.level >= LogLevel::Warn);
        }
        self.entries.push(entry);
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Debug, message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Info, message));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Warn, message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.log(LogEntry::new(LogLevel::Error, message));
    }

    /// Returns all recorded entries, oldest first
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Returns recorded entries at exactly `level`
    pub fn entries_at(&self, level: LogLevel) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.level == level).collect()
    }
}
