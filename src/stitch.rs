//! Three-file orbit/clock splicing
//!
//! Joins the products of day-1, day and day+1 into one continuous file
//! under the middle file's name. Only two line conventions are known here:
//! the data-block marker that opens the first epoch and the end marker.
//!
//! Merged layout:
//!
//! ```text
//! header of current        (lines before its first data marker)
//! data block of prior      (first data marker up to its end marker)
//! data block of current
//! data block of next
//! end marker               (always exactly one)
//! ```
//!
//! The untouched middle file is kept as `<name>.orig`; a second run
//! splices from that backup again and produces the same output.

use crate::downloader::config::{SP3_DATA_MARKER, SP3_END_MARKER, STITCH_BACKUP_SUFFIX};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Stitch errors
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    /// One of the three inputs was never acquired
    #[error("stitch input missing: {0}")]
    InputMissing(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Line conventions delimiting the data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceMarkers {
    /// Prefix of the line opening the data block
    pub data: String,
    /// Content of the end-of-file line
    pub end: String,
}

impl Default for SpliceMarkers {
    fn default() -> Self {
        Self {
            data: SP3_DATA_MARKER.to_string(),
            end: SP3_END_MARKER.to_string(),
        }
    }
}

impl SpliceMarkers {
    fn is_data(&self, line: &str) -> bool {
        line.starts_with(&self.data)
    }

    fn is_end(&self, line: &str) -> bool {
        line.trim_end() == self.end
    }
}

/// Backup location of the middle file
pub fn backup_path(current: &Path) -> PathBuf {
    let mut name = current.as_os_str().to_owned();
    name.push(STITCH_BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Splice `[prior, current, next]` into `current`.
///
/// Returns `Ok(false)` and touches nothing if an input is missing.
pub fn stitch(files: [&Path; 3], markers: &SpliceMarkers) -> Result<bool, StitchError> {
    match splice(files, markers) {
        Ok(()) => {
            info!(current = %files[1].display(), "stitched");
            crate::metrics::record_stitch(true);
            Ok(true)
        }
        Err(StitchError::InputMissing(path)) => {
            warn!(missing = %path, "stitch skipped, input missing");
            crate::metrics::record_stitch(false);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Splice `[prior, current, next]` into `current`, failing with
/// [`StitchError::InputMissing`] if an input is absent
pub fn splice(files: [&Path; 3], markers: &SpliceMarkers) -> Result<(), StitchError> {
    let [prior, current, next] = files;
    let backup = backup_path(current);

    // a neighbour spliced earlier in the same run is read from its backup
    let prior_source = unspliced(prior)?;
    let next_source = unspliced(next)?;
    if !current.is_file() && !backup.is_file() {
        return Err(StitchError::InputMissing(current.display().to_string()));
    }

    if !backup.is_file() {
        fs::rename(current, &backup).map_err(|e| {
            StitchError::Io(format!("Failed to back up {}: {e}", current.display()))
        })?;
    }

    let prior_text = read(&prior_source)?;
    let current_text = read(&backup)?;
    let next_text = read(&next_source)?;

    let merged = merge(&prior_text, &current_text, &next_text, markers);

    let dir = current
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| StitchError::Io(format!("Failed to create temp file: {e}")))?;
    tmp.write_all(merged.as_bytes())
        .map_err(|e| StitchError::Io(format!("Failed to write merged file: {e}")))?;
    tmp.persist(current)
        .map_err(|e| StitchError::Io(format!("Failed to persist {}: {e}", current.display())))?;
    Ok(())
}

/// Original content of `path`: its backup if it was already spliced
fn unspliced(path: &Path) -> Result<PathBuf, StitchError> {
    let backup = backup_path(path);
    if backup.is_file() {
        Ok(backup)
    } else if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(StitchError::InputMissing(path.display().to_string()))
    }
}

fn read(path: &Path) -> Result<String, StitchError> {
    fs::read_to_string(path)
        .map_err(|e| StitchError::Io(format!("Failed to read {}: {e}", path.display())))
}

/// Pure text merge of three file bodies
pub fn merge(prior: &str, current: &str, next: &str, markers: &SpliceMarkers) -> String {
    let mut out = String::with_capacity(prior.len() + current.len() + next.len());

    for line in header(current, markers) {
        push_line(&mut out, line);
    }
    for text in [prior, current, next] {
        for line in data_block(text, markers) {
            push_line(&mut out, line);
        }
    }
    push_line(&mut out, &markers.end);
    out
}

fn header<'t>(text: &'t str, markers: &'t SpliceMarkers) -> impl Iterator<Item = &'t str> {
    text.lines()
        .take_while(move |l| !markers.is_data(l))
        .filter(move |l| !markers.is_end(l))
}

fn data_block<'t>(text: &'t str, markers: &'t SpliceMarkers) -> impl Iterator<Item = &'t str> {
    text.lines()
        .skip_while(move |l| !markers.is_data(l))
        .take_while(move |l| !markers.is_end(l))
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}
