//! `stitch` command: splice three files by hand

use super::{Cli, CliError, OutputFormat};
use crate::stitch::{splice, SpliceMarkers};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

/// Stitch arguments
#[derive(Debug, Args)]
pub struct StitchArgs {
    /// File of the previous day
    pub prior: PathBuf,

    /// File of the day itself; rewritten in place, original kept as `.orig`
    pub current: PathBuf,

    /// File of the next day
    pub next: PathBuf,

    /// Prefix of the line opening the data block
    #[arg(long, default_value = "* ")]
    pub data_marker: String,

    /// End-of-file line
    #[arg(long, default_value = "EOF")]
    pub end_marker: String,
}

impl StitchArgs {
    /// Markers from the arguments; an empty marker would match every line
    pub fn markers(&self) -> Result<SpliceMarkers, CliError> {
        if self.data_marker.is_empty() {
            return Err(CliError::InvalidArgument("--data-marker must not be empty".to_string()));
        }
        if self.end_marker.trim_end().is_empty() {
            return Err(CliError::InvalidArgument("--end-marker must not be empty".to_string()));
        }
        Ok(SpliceMarkers {
            data: self.data_marker.clone(),
            end: self.end_marker.clone(),
        })
    }

    /// Splice the three files
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let markers = self.markers()?;
        let result = splice([&self.prior, &self.current, &self.next], &markers);
        crate::metrics::record_stitch(result.is_ok());

        match cli.output_format {
            OutputFormat::Json => {
                let output = json!({
                    "success": result.is_ok(),
                    "output_path": self.current.display().to_string(),
                    "error": result.as_ref().err().map(ToString::to_string),
                });
                println!("{output}");
            }
            OutputFormat::Human => {
                if result.is_ok() {
                    println!("Stitched {}", self.current.display());
                }
            }
        }
        result.map_err(CliError::from)
    }
}
