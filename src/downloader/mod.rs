//! Acquisition of single products
//!
//! # Overview
//!
//! 1. **Request**: describe the artifact with [`job::ProductRequest`]
//! 2. **Execution**: hand it to [`executor::AcquisitionEngine`] together
//!    with a destination directory and a [`context::RunContext`]
//! 3. **Outcome**: inspect [`job::AcquisitionOutcome`], whose status is
//!    one of [`job::AcquisitionStatus`]
//!
//! # Quick Start
//!
//! ```no_run
//! use gnss_data_downloader::downloader::{AcquisitionEngine, ProductRequest, RunContext};
//! use gnss_data_downloader::fetcher::ExternalTools;
//! use gnss_data_downloader::output::MemoryAuditSink;
//! use gnss_data_downloader::registry::ArchiveCatalog;
//! use gnss_data_downloader::{CalendarDate, Mirror, ProductKind, ProviderId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = ArchiveCatalog::embedded(Mirror::Cddis)?;
//! let tools = ExternalTools::system();
//! let audit = MemoryAuditSink::default();
//! let ctx = RunContext::new(&audit);
//!
//! let request = ProductRequest::new(
//!     ProductKind::Orbit,
//!     CalendarDate::ymd(2023, 6, 15)?.to_epoch(),
//!     ProviderId::parse("igs")?,
//! );
//! let outcome = AcquisitionEngine::new(&catalog, &tools).acquire(&request, "./orb".as_ref(), &ctx)?;
//! println!("{}", outcome.status);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! A product no archive could deliver is not an error: it is an outcome
//! with status `Failed`. [`AcquireError`] covers resolution failures and
//! local I/O problems only.

pub mod config;
pub mod context;
pub mod executor;
pub mod job;

pub use context::RunContext;
pub use executor::AcquisitionEngine;
pub use job::{AcquisitionOutcome, AcquisitionStatus, ProductRequest};

use crate::output::OutputError;
use crate::resolver::ResolveError;

/// Acquisition errors
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    /// Request could not be resolved against the catalog
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Local filesystem error
    #[error("IO error: {0}")]
    Io(String),

    /// Audit trail or output directory error
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}
