//! Audit log, local directory layout and run lock

pub mod audit;
pub mod lock;
pub mod path;

pub use audit::{AuditLevel, AuditSink, FileAuditSink, MemoryAuditSink};
pub use lock::RunLock;
pub use path::{find_existing, list_matching, sanitize_file_name, DirectoryLayout};

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Another run holds the data directory
    #[error("data directory is locked: {0}")]
    Locked(String),

    /// Audit log write failed
    #[error("audit log error: {0}")]
    AuditError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
