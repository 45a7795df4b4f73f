//! `gzip` decompression tool

use super::{program_name, run_command, DecompressTool, ToolResult};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Decompresses `.gz` and `.Z` files in place with `gzip -d -f`
#[derive(Debug, Clone)]
pub struct GzipDecompress {
    program: PathBuf,
}

impl GzipDecompress {
    /// Use the program at `program`
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }
}

impl DecompressTool for GzipDecompress {
    fn decompress(&self, path: &Path) -> ToolResult<()> {
        let mut command = Command::new(&self.program);
        command.arg("-d").arg("-f").arg(path);
        run_command(command, &program_name(&self.program)).map(|_| ())
    }
}
