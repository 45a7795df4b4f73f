//! CLI command implementations

pub mod config;
pub mod error;
pub mod resolve;
pub mod run;
pub mod sources;
pub mod stitch;

pub use config::{ConfigError, RunConfig};
pub use error::CliError;
pub use resolve::ResolveArgs;
pub use run::{RunArgs, RunSummary};
pub use sources::SourcesCommand;
pub use stitch::StitchArgs;

use crate::shutdown::SharedShutdown;
use clap::{ArgAction, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// GNSS Data Downloader CLI
#[derive(Parser, Debug)]
#[command(name = "gnss-data-downloader")]
#[command(about = "Download GNSS observations and products from IGS archive mirrors", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Increase log detail (-v per-URL traces, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Main data directory, overriding the configuration
    #[arg(long, global = true, env = "GNSS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Serve Prometheus metrics on this address
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download everything a run configuration asks for
    Run(RunArgs),

    /// Print the candidate URLs for one product without downloading
    Resolve(ResolveArgs),

    /// List catalog products and providers
    Sources(SourcesCommand),

    /// Splice three adjacent orbit/clock files
    Stitch(StitchArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

impl Cli {
    /// Run the selected command to completion
    pub fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        match &self.command {
            Commands::Run(args) => {
                let summary = args.execute(self, shutdown)?;
                if summary.interrupted {
                    return Err(CliError::Interrupted);
                }
                Ok(())
            }
            Commands::Resolve(args) => args.execute(self),
            Commands::Sources(cmd) => cmd.execute(self),
            Commands::Stitch(args) => args.execute(self),
        }
    }
}
