//! Real-time pipeline log streaming via Server-Sent Events (SSE).
//!
//! Pipeline steps log through a broadcast channel so the rendering frontend
//! can show progress while a series request runs. Entries are mirrored to
//! stderr for CLI runs; with no SSE subscriber the broadcast send is a
//! no-op.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Log level for frontend display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Global log broadcaster.
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all connected SSE clients.
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Subscribe to the log stream.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }

    /// Send an entry to all subscribers; silently dropped with none.
    pub fn send(&self, entry: LogEntry) {
        let _ = self.sender.send(entry);
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

fn emit(level: LogLevel, message: String) {
    let prefix = match level {
        LogLevel::Info => "INFO ",
        LogLevel::Success => "OK   ",
        LogLevel::Warning => "WARN ",
        LogLevel::Error => "ERROR",
    };
    eprintln!("[{}] {}", prefix, message);
    LOG_BROADCASTER.send(LogEntry::new(level, message));
}

pub fn log_info(message: impl Into<String>) {
    emit(LogLevel::Info, message.into());
}

pub fn log_success(message: impl Into<String>) {
    emit(LogLevel::Success, message.into());
}

pub fn log_warning(message: impl Into<String>) {
    emit(LogLevel::Warning, message.into());
}

pub fn log_error(message: impl Into<String>) {
    emit(LogLevel::Error, message.into());
}
