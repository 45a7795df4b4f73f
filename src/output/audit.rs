//! Append-only audit trail
//!
//! One line per acquisition outcome, independent of the tracing
//! subscriber. Operators grep it to diagnose archive outages, so every
//! line names the local artifact and the remote URL.

use super::{OutputError, OutputResult};
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Severity of an audit line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    /// Artifact available
    Info,
    /// Artifact could not be acquired
    Warning,
}

impl AuditLevel {
    fn label(&self) -> &'static str {
        match self {
            AuditLevel::Info => "INFO",
            AuditLevel::Warning => "WARNING",
        }
    }
}

/// Destination of audit lines. Implementations must tolerate concurrent appends.
pub trait AuditSink: Send + Sync {
    /// Append one line
    fn append(&self, level: AuditLevel, message: &str) -> OutputResult<()>;
}

/// Audit log backed by a file opened once per run
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Open `path` for appending, creating it and its parent if needed
    pub fn open(path: impl AsRef<Path>) -> OutputResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::IoError(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| OutputError::AuditError(format!("{}: {e}", path.display())))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Log file location
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, level: AuditLevel, message: &str) -> OutputResult<()> {
        let line = format!(
            "{} {}: {}\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            level.label(),
            message
        );
        let mut file = self
            .file
            .lock()
            .map_err(|_| OutputError::AuditError("audit log mutex poisoned".to_string()))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| OutputError::AuditError(format!("{}: {e}", self.path.display())))
    }
}

/// In-memory audit sink, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryAuditSink {
    /// Lines recorded so far, formatted `LEVEL: message`
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, level: AuditLevel, message: &str) -> OutputResult<()> {
        self.lines
            .lock()
            .map_err(|_| OutputError::AuditError("audit buffer mutex poisoned".to_string()))?
            .push(format!("{}: {}", level.label(), message));
        Ok(())
    }
}
