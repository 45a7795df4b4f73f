//! Local directory layout and canonical-name lookup
//!
//! Every product kind lands in a sub-directory of the main data directory
//! (`obs`, `nav`, `orb`, ...). Canonical names may contain a `*` segment;
//! lookups then match against the directory listing.

use super::{OutputError, OutputResult};
use crate::registry::matches_wildcard;
use crate::ProductKind;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Maps product kinds to local directories
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryLayout {
    root: PathBuf,
    overrides: BTreeMap<ProductKind, PathBuf>,
}

impl DirectoryLayout {
    /// Default layout below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            overrides: BTreeMap::new(),
        }
    }

    /// Place `kind` in `dir` (relative paths are joined to the root)
    pub fn with_subdir(mut self, kind: ProductKind, dir: impl Into<PathBuf>) -> Self {
        self.overrides.insert(kind, dir.into());
        self
    }

    /// Main data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `kind`
    pub fn dir_for(&self, kind: ProductKind) -> PathBuf {
        match self.overrides.get(&kind) {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.root.join(dir),
            None => self.root.join(kind.default_subdir()),
        }
    }

    /// Directory for `kind`, created if missing
    pub fn ensure(&self, kind: ProductKind) -> OutputResult<PathBuf> {
        let dir = self.dir_for(kind);
        fs::create_dir_all(&dir).map_err(|e| {
            OutputError::IoError(format!("Failed to create directory {}: {e}", dir.display()))
        })?;
        Ok(dir)
    }
}

/// Sanitize a file name for filesystem safety.
///
/// Directory separators and `:` become `_`, `..` becomes `__`.
pub fn sanitize_file_name(name: &str) -> String {
    name.replace("..", "__").replace(['/', '\\', ':'], "_")
}

/// Non-empty file in `dir` whose name matches `pattern` (first in name order)
pub fn find_existing(dir: &Path, pattern: &str) -> Option<PathBuf> {
    if !pattern.contains('*') {
        let path = dir.join(pattern);
        return is_non_empty_file(&path).then_some(path);
    }
    list_matching(dir, pattern).into_iter().next()
}

/// Every non-empty file in `dir` whose name matches `pattern`, sorted
pub fn list_matching(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| matches_wildcard(pattern, name))
        })
        .filter(|path| is_non_empty_file(path))
        .collect();
    found.sort();
    found
}

fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
