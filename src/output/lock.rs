//! Advisory lock on a main data directory
//!
//! Two runs writing the same tree could both see a file as missing and
//! fetch it concurrently. The lock is an `fd-lock` write lock on a file in
//! the data directory, held for the lifetime of [`RunLock`].

use super::{OutputError, OutputResult};
use crate::downloader::config::RUN_LOCK_NAME;
use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive lock on a data directory
pub struct RunLock {
    // the OS lock lives as long as this descriptor
    _lock: RwLock<File>,
    path: PathBuf,
}

impl RunLock {
    /// Try to lock `dir` without blocking
    pub fn try_acquire(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir).map_err(|e| OutputError::IoError(e.to_string()))?;

        let path = dir.join(RUN_LOCK_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| OutputError::IoError(format!("Failed to open lock file: {e}")))?;

        let mut lock = RwLock::new(file);
        match lock.try_write() {
            // keep the lock until the file is closed on drop
            Ok(guard) => std::mem::forget(guard),
            Err(e) => {
                return Err(OutputError::Locked(format!("{}: {e}", path.display())));
            }
        }

        Ok(Self { _lock: lock, path })
    }

    /// Lock file location
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for RunLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLock").field("path", &self.path).finish()
    }
}
