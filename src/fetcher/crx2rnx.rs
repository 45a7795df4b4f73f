//! Hatanaka `crx2rnx` conversion tool

use super::{program_name, run_command, ConvertTool, ToolError, ToolResult};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Expands compact RINEX with `crx2rnx -`, streaming the input file on stdin
/// and writing stdout to the output path.
#[derive(Debug, Clone)]
pub struct Crx2rnxConvert {
    program: PathBuf,
}

impl Crx2rnxConvert {
    /// Use the program at `program`
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }
}

impl ConvertTool for Crx2rnxConvert {
    fn convert(&self, input: &Path, output: &Path) -> ToolResult<()> {
        let stdin = File::open(input)
            .map_err(|e| ToolError::Io(format!("open {}: {e}", input.display())))?;
        let stdout = File::create(output)
            .map_err(|e| ToolError::Io(format!("create {}: {e}", output.display())))?;

        let mut command = Command::new(&self.program);
        command
            .arg("-")
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout));

        let result = run_command(command, &program_name(&self.program)).map(|_| ());
        if result.is_err() {
            // never leave a truncated observation file behind
            let _ = fs::remove_file(output);
        }
        result
    }
}
