//! Conversion log stream.
//!
//! Every mapping decision worth surfacing (lossy fields, fallbacks, missing
//! cluster context) is published here. Entries are echoed to stderr and
//! broadcast to any subscriber, which is how tests and embedding callers
//! observe them.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all subscribers
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    echo: AtomicBool,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender, echo: AtomicBool::new(true) }
    }

    /// Send a log entry to all subscribers
    pub fn log(&self, entry: LogEntry) {
        // stdout may carry converted documents, so echo goes to stderr
        if self.echo.load(Ordering::Relaxed) {
            let prefix = match entry.level {
                LogLevel::Info => "   ",
                LogLevel::Success => "   ✓",
                LogLevel::Warning => "   ⚠️",
                LogLevel::Error => "   ❌",
            };
            let indent = "   ".repeat(entry.indent as usize);
            eprintln!("{}{} {}", indent, prefix, entry.message);
        }

        #[cfg(test)]
        test_support::record(&entry);

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Turn the stderr echo on or off.
    pub fn set_echo(&self, echo: bool) {
        self.echo.store(echo, Ordering::Relaxed);
    }

    /// Get a receiver for the log stream
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::info(msg).with_indent(indent));
}

/// Drain everything currently buffered in a receiver.
///
/// Entries dropped because the receiver lagged are skipped.
pub fn drain(receiver: &mut broadcast::Receiver<LogEntry>) -> Vec<LogEntry> {
    let mut entries = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(entry) => entries.push(entry),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    entries
}
