//! `wget` transfer tool

use super::{program_name, run_command, ToolResult, TransferRequest, TransferTool};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Transfers files with `wget`.
///
/// FTP URLs may carry a `*` in the filename; `wget` expands it against the
/// remote listing. The remote directory structure is flattened with
/// `-nH --cut-dirs` so files land directly in the work directory.
#[derive(Debug, Clone)]
pub struct WgetTransfer {
    program: PathBuf,
    verbose: bool,
}

impl WgetTransfer {
    /// Use the program at `program`
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            verbose: false,
        }
    }

    /// Show `wget` progress output instead of running quietly
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn arguments(&self, request: &TransferRequest<'_>) -> Vec<String> {
        let mut args = vec![if self.verbose { "-nv" } else { "-q" }.to_string()];

        if is_ftp(request.url) {
            args.push("--passive-ftp".to_string());
            args.push("--ftp-user=anonymous".to_string());
            args.push("--ftp-password=anonymous".to_string());
        }
        if request.url.starts_with("ftps://") {
            args.push("--secure-protocol=auto".to_string());
        }

        args.push("-nH".to_string());
        args.push(format!("--cut-dirs={}", request.cut_dirs));
        args.push("-P".to_string());
        args.push(request.work_dir.display().to_string());
        args.push(request.url.to_string());
        args
    }
}

impl TransferTool for WgetTransfer {
    fn fetch(&self, request: &TransferRequest<'_>) -> ToolResult<()> {
        let args = self.arguments(request);
        debug!(program = %self.program.display(), ?args, "running transfer");

        let mut command = Command::new(&self.program);
        command.args(&args);
        let output = run_command(command, &program_name(&self.program))?;

        if self.verbose && !output.stderr.is_empty() {
            eprint!("{}", String::from_utf8_lossy(&output.stderr));
        }
        Ok(())
    }
}

fn is_ftp(url: &str) -> bool {
    url.starts_with("ftp://") || url.starts_with("ftps://")
}
