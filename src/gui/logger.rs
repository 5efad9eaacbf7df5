//! Calibration event log for the guide window.
//!
//! Entries are kept in memory and appended to a per-run file under the
//! platform data directory.

use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::settings::AppSettings;

/// Kind of calibration event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Fixation,
    Success,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Fixation => "FIXATION",
            LogLevel::Success => "SUCCESS",
            LogLevel::Error => "ERROR",
        }
    }
}

/// A single log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }

    /// Format the entry for file storage.
    pub fn format_file(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level.as_str(),
            self.message
        )
    }
}

/// Log of one calibration run.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    entries: Vec<LogEntry>,
    log_file: Option<PathBuf>,
}

impl SessionLog {
    /// Log backed by a new file in the application logs directory.
    ///
    /// Falls back to memory only when the directory cannot be created.
    pub fn new() -> Self {
        let log_file = AppSettings::logs_dir().and_then(|dir| Self::create_log_file(&dir));
        if log_file.is_none() {
            tracing::warn!("Session log file unavailable, keeping entries in memory only");
        }
        Self {
            entries: Vec::new(),
            log_file,
        }
    }

    /// Log backed by a new file in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            entries: Vec::new(),
            log_file: Self::create_log_file(dir),
        }
    }

    fn create_log_file(dir: &Path) -> Option<PathBuf> {
        fs::create_dir_all(dir).ok()?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("calibration_{}.log", timestamp));
        File::create(&path).ok()?;

        Some(path)
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::new(level, message);

        if let Some(ref path) = self.log_file {
            if let Ok(mut file) = OpenOptions::new().append(true).open(path) {
                let _ = writeln!(file, "{}", entry.format_file());
            }
        }

        self.entries.push(entry);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn fixation(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Fixation, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn log_file_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }
}
