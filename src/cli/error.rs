//! CLI error types and conversions

use super::config::ConfigError;
use crate::downloader::AcquireError;
use crate::identifier::IdentifierError;
use crate::metrics::MetricsError;
use crate::output::OutputError;
use crate::registry::RegistryError;
use crate::resolver::ResolveError;
use crate::stitch::StitchError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Identifier error
    #[error("identifier error: {0}")]
    IdentifierError(#[from] IdentifierError),

    /// Registry error
    #[error("registry error: {0}")]
    RegistryError(#[from] RegistryError),

    /// Resolve error
    #[error("resolve error: {0}")]
    ResolveError(#[from] ResolveError),

    /// Acquisition error
    #[error("acquisition error: {0}")]
    AcquireError(#[from] AcquireError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Stitch error
    #[error("stitch error: {0}")]
    StitchError(#[from] StitchError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Metrics error
    #[error("metrics error: {0}")]
    MetricsError(#[from] MetricsError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Ctrl+C stopped the run
    #[error("run interrupted")]
    Interrupted,
}
