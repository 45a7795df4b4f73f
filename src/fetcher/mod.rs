//! External tool collaborators
//!
//! Transfer, decompression and format conversion are delegated to external
//! command-line tools (`wget`, `gzip`, `crx2rnx`). The acquisition engine
//! talks to them through the traits below so tests can substitute an
//! in-process fake archive.
//!
//! A tool's exit status is advisory: the engine judges success only by the
//! presence of the expected output file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub mod crx2rnx;
pub mod gzip;
pub mod wget;

pub use crx2rnx::Crx2rnxConvert;
pub use gzip::GzipDecompress;
pub use wget::WgetTransfer;

/// Tool errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ToolError {
    /// The tool could not be started
    #[error("failed to launch {tool}: {reason}")]
    Launch {
        /// Program name
        tool: String,
        /// OS error
        reason: String,
    },

    /// The tool ran and exited unsuccessfully
    #[error("{tool} exited with {status}: {stderr}")]
    Exit {
        /// Program name
        tool: String,
        /// Exit status description
        status: String,
        /// Trailing standard error
        stderr: String,
    },

    /// Local file handling around the tool failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl ToolError {
    /// Whether the tool never ran
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, ToolError::Launch { .. })
    }
}

/// Result type for tool invocations
pub type ToolResult<T> = Result<T, ToolError>;

/// One transfer invocation
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest<'a> {
    /// Remote URL; the final segment may contain `*`
    pub url: &'a str,
    /// Remote directory levels to strip below the host
    pub cut_dirs: usize,
    /// Local directory receiving the file(s)
    pub work_dir: &'a Path,
}

/// Fetches remote files into a local directory
pub trait TransferTool: Send + Sync {
    /// Fetch the file(s) matching `request.url` into `request.work_dir`.
    ///
    /// On "not found" no file appears; the exit status is not reliable.
    fn fetch(&self, request: &TransferRequest<'_>) -> ToolResult<()>;
}

/// Replaces a compressed file with its decompressed content
pub trait DecompressTool: Send + Sync {
    /// Decompress `path` (`.gz` or `.Z`) in place, removing the input
    fn decompress(&self, path: &Path) -> ToolResult<()>;
}

/// Converts compact RINEX observations to full RINEX
pub trait ConvertTool: Send + Sync {
    /// Write the converted content of `input` to `output`; `input` is untouched
    fn convert(&self, input: &Path, output: &Path) -> ToolResult<()>;
}

/// Program locations for the system tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// Transfer program
    pub wget: PathBuf,
    /// Decompression program
    pub gzip: PathBuf,
    /// Hatanaka decompression program
    pub crx2rnx: PathBuf,
    /// Pass tool output through instead of running quietly
    pub print_tool_output: bool,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            wget: PathBuf::from("wget"),
            gzip: PathBuf::from("gzip"),
            crx2rnx: PathBuf::from("crx2rnx"),
            print_tool_output: false,
        }
    }
}

/// The three collaborators used by the acquisition engine
pub struct ExternalTools {
    transfer: Box<dyn TransferTool>,
    decompress: Box<dyn DecompressTool>,
    convert: Box<dyn ConvertTool>,
}

impl ExternalTools {
    /// Assemble from arbitrary implementations
    pub fn new(
        transfer: Box<dyn TransferTool>,
        decompress: Box<dyn DecompressTool>,
        convert: Box<dyn ConvertTool>,
    ) -> Self {
        Self {
            transfer,
            decompress,
            convert,
        }
    }

    /// System tools found on `PATH`
    pub fn system() -> Self {
        Self::from_paths(&ToolPaths::default())
    }

    /// System tools at the configured locations
    pub fn from_paths(paths: &ToolPaths) -> Self {
        Self::new(
            Box::new(WgetTransfer::new(&paths.wget).verbose(paths.print_tool_output)),
            Box::new(GzipDecompress::new(&paths.gzip)),
            Box::new(Crx2rnxConvert::new(&paths.crx2rnx)),
        )
    }

    /// Replace the transfer tool
    pub fn with_transfer(mut self, transfer: Box<dyn TransferTool>) -> Self {
        self.transfer = transfer;
        self
    }

    /// Transfer tool
    pub fn transfer(&self) -> &dyn TransferTool {
        self.transfer.as_ref()
    }

    /// Decompression tool
    pub fn decompress(&self) -> &dyn DecompressTool {
        self.decompress.as_ref()
    }

    /// Conversion tool
    pub fn convert(&self) -> &dyn ConvertTool {
        self.convert.as_ref()
    }
}

impl std::fmt::Debug for ExternalTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalTools").finish_non_exhaustive()
    }
}

/// Run a prepared command to completion and map its status
pub(crate) fn run_command(mut command: Command, tool: &str) -> ToolResult<Output> {
    let output = command.output().map_err(|e| ToolError::Launch {
        tool: tool.to_string(),
        reason: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ToolError::Exit {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: last_line(&stderr).to_string(),
        });
    }

    Ok(output)
}

pub(crate) fn program_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

fn last_line(text: &str) -> &str {
    text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}
