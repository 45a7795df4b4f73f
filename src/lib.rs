//! # GNSS Data Downloader Library
//!
//! Resolves and retrieves dated GNSS observation files and analysis products
//! (broadcast ephemerides, precise orbits and clocks, biases, ionosphere and
//! troposphere products) from the IGS archive mirrors.
//!
//! The same logical artifact lives under different directory layouts,
//! filename conventions and compression schemes on each mirror. The library
//! turns an abstract [`downloader::ProductRequest`] into an ordered list of
//! remote candidates, tries them with external tools until one succeeds and
//! normalises the result to a canonical local name.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gnss_data_downloader::downloader::{AcquisitionEngine, ProductRequest, RunContext};
//! use gnss_data_downloader::fetcher::ExternalTools;
//! use gnss_data_downloader::identifier::{Mirror, ProviderId};
//! use gnss_data_downloader::output::MemoryAuditSink;
//! use gnss_data_downloader::registry::ArchiveCatalog;
//! use gnss_data_downloader::time::CalendarDate;
//! use gnss_data_downloader::{NamingPreference, ProductKind};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = ArchiveCatalog::embedded(Mirror::Cddis)?;
//! let tools = ExternalTools::system();
//! let audit = MemoryAuditSink::default();
//! let ctx = RunContext::new(&audit);
//!
//! let request = ProductRequest::new(
//!     ProductKind::Navigation,
//!     CalendarDate::ymd(2023, 6, 15)?.to_epoch(),
//!     ProviderId::parse("igs")?,
//! )
//! .with_naming(NamingPreference::LongThenShort);
//!
//! let engine = AcquisitionEngine::new(&catalog, &tools);
//! let outcome = engine.acquire(&request, "./nav".as_ref(), &ctx)?;
//! println!("{}", outcome.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`time`] - Calendar, day-of-year and GPS week algebra
//! - [`identifier`] - Provider, station and mirror identifiers
//! - [`registry`] - Embedded archive catalog
//! - [`resolver`] - Candidate generation from catalog templates
//! - [`fetcher`] - External transfer, decompress and convert tools
//! - [`downloader`] - Acquisition engine and run context
//! - [`output`] - Audit log, local directory layout and run lock
//! - [`stitch`] - Three-file orbit/clock splicing

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Product acquisition
pub mod downloader;

/// External tool collaborators
pub mod fetcher;

/// Provider, station and mirror identifiers
pub mod identifier;

/// Metrics counters
pub mod metrics;

/// Audit log, directory layout and run lock
pub mod output;

/// Archive catalog
pub mod registry;

/// Candidate resolution
pub mod resolver;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Orbit/clock file splicing
pub mod stitch;

/// Calendar and GPS time algebra
pub mod time;

// Re-export commonly used types
pub use identifier::{Mirror, ProviderId, StationCode};
pub use time::{CalendarDate, Epoch, GpsTime};

/// Logical kind of a retrievable artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// RINEX observation files
    Observation,
    /// Broadcast navigation messages
    Navigation,
    /// Precise orbits (SP3)
    Orbit,
    /// Precise clocks
    Clock,
    /// Earth rotation parameters
    EarthOrientation,
    /// ORBEX satellite attitude
    AttitudeExchange,
    /// Differential code biases
    DifferentialBias,
    /// Observable-specific signal biases
    ObservableBias,
    /// Global ionosphere maps (IONEX)
    IonosphereMap,
    /// Rate-of-TEC index
    RotiIndex,
    /// Zenith troposphere delay
    Troposphere,
    /// Weekly SINEX solution
    WeeklySolution,
    /// ANTEX antenna model
    AntennaModel,
}

impl ProductKind {
    /// Every kind, in catalog order
    pub const ALL: [ProductKind; 13] = [
        ProductKind::Observation,
        ProductKind::Navigation,
        ProductKind::Orbit,
        ProductKind::Clock,
        ProductKind::EarthOrientation,
        ProductKind::AttitudeExchange,
        ProductKind::DifferentialBias,
        ProductKind::ObservableBias,
        ProductKind::IonosphereMap,
        ProductKind::RotiIndex,
        ProductKind::Troposphere,
        ProductKind::WeeklySolution,
        ProductKind::AntennaModel,
    ];

    /// Snake-case name used in the catalog and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Observation => "observation",
            ProductKind::Navigation => "navigation",
            ProductKind::Orbit => "orbit",
            ProductKind::Clock => "clock",
            ProductKind::EarthOrientation => "earth_orientation",
            ProductKind::AttitudeExchange => "attitude_exchange",
            ProductKind::DifferentialBias => "differential_bias",
            ProductKind::ObservableBias => "observable_bias",
            ProductKind::IonosphereMap => "ionosphere_map",
            ProductKind::RotiIndex => "roti_index",
            ProductKind::Troposphere => "troposphere",
            ProductKind::WeeklySolution => "weekly_solution",
            ProductKind::AntennaModel => "antenna_model",
        }
    }

    /// Default sub-directory of the main data directory
    pub fn default_subdir(&self) -> &'static str {
        match self {
            ProductKind::Observation => "obs",
            ProductKind::Navigation => "nav",
            ProductKind::Orbit => "orb",
            ProductKind::Clock => "clk",
            ProductKind::EarthOrientation => "eop",
            ProductKind::AttitudeExchange => "obx",
            ProductKind::DifferentialBias | ProductKind::ObservableBias => "bia",
            ProductKind::IonosphereMap | ProductKind::RotiIndex => "ion",
            ProductKind::Troposphere => "ztd",
            ProductKind::WeeklySolution => "snx",
            ProductKind::AntennaModel => "tbl",
        }
    }

    /// Whether requests of this kind are issued per station
    pub fn is_station_based(&self) -> bool {
        matches!(self, ProductKind::Observation | ProductKind::Troposphere)
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let kind = match lower.as_str() {
            "observation" | "obs" => ProductKind::Observation,
            "navigation" | "nav" => ProductKind::Navigation,
            "orbit" | "orb" | "sp3" => ProductKind::Orbit,
            "clock" | "clk" => ProductKind::Clock,
            "earth_orientation" | "eop" | "erp" => ProductKind::EarthOrientation,
            "attitude_exchange" | "obx" => ProductKind::AttitudeExchange,
            "differential_bias" | "dsb" | "dcb" => ProductKind::DifferentialBias,
            "observable_bias" | "osb" => ProductKind::ObservableBias,
            "ionosphere_map" | "ion" | "gim" => ProductKind::IonosphereMap,
            "roti_index" | "rot" | "roti" => ProductKind::RotiIndex,
            "troposphere" | "trp" | "ztd" => ProductKind::Troposphere,
            "weekly_solution" | "snx" => ProductKind::WeeklySolution,
            "antenna_model" | "atx" => ProductKind::AntennaModel,
            _ => return Err(format!("Invalid product kind: {s}")),
        };
        Ok(kind)
    }
}

/// Which filename conventions a request may try, and in what order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPreference {
    /// Long (RINEX 3 style) names only
    #[serde(alias = "long")]
    LongOnly,
    /// Short (8.3 style) names only
    #[serde(alias = "short")]
    ShortOnly,
    /// Long names first, short names as fallback
    #[default]
    #[serde(alias = "both")]
    LongThenShort,
}

impl fmt::Display for NamingPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NamingPreference::LongOnly => "long_only",
            NamingPreference::ShortOnly => "short_only",
            NamingPreference::LongThenShort => "long_then_short",
        };
        f.write_str(s)
    }
}

impl FromStr for NamingPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "long_only" => Ok(NamingPreference::LongOnly),
            "short" | "short_only" => Ok(NamingPreference::ShortOnly),
            "both" | "long_then_short" => Ok(NamingPreference::LongThenShort),
            _ => Err(format!("Invalid naming preference: {s}")),
        }
    }
}

/// Filename convention of a single candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingTag {
    /// Long, self-describing multi-field name
    Long,
    /// Legacy short name
    Short,
}

impl fmt::Display for NamingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingTag::Long => f.write_str("long"),
            NamingTag::Short => f.write_str("short"),
        }
    }
}
