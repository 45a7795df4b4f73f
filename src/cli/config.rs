//! YAML run configuration
//!
//! ```yaml
//! main_dir: /data/gnss
//! ftp: cddis
//! time: { year: 2023, doy: 166, ndays: 3 }
//! minus_add_1day: true
//! merge_sp3: true
//! products:
//!   observation: { from: igs, variant: daily, list: sites.list }
//!   navigation: { from: igs, variant: mixed3, naming: short }
//!   orbit: { from: igs+cod }
//!   clock: { from: igs+cod }
//!   ionosphere_map: { from: all }
//! tools: { wget: /usr/bin/wget, print_tool_output: false }
//! ```

use crate::downloader::config::{ALL_MGEX_PROVIDERS_KEYWORD, ALL_PROVIDERS_KEYWORD};
use crate::fetcher::ToolPaths;
use crate::identifier::{Mirror, ProductLine, ProviderId, StationCode};
use crate::output::DirectoryLayout;
use crate::registry::ArchiveCatalog;
use crate::time::{normalize_year, Epoch};
use crate::{NamingPreference, ProductKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {reason}")]
    Read {
        /// Offending file
        path: String,
        /// OS error
        reason: String,
    },

    /// YAML did not match the schema
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Field name
        field: String,
        /// What is wrong
        reason: String,
    },
}

/// Processing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Year (two-digit years are accepted)
    pub year: i32,
    /// Day of year of the first day
    pub doy: u32,
    /// Number of consecutive days
    #[serde(default = "default_ndays")]
    pub ndays: u32,
}

fn default_ndays() -> u32 {
    1
}

/// Options of one product kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSection {
    /// Switch for this product
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Providers joined with `+`; every listed provider is fetched.
    /// `all` and `all_m` expand to every matching catalog provider.
    pub from: String,
    /// Catalog variant; the provider's default when absent
    #[serde(default)]
    pub variant: Option<String>,
    /// `all` or a site-list file, for station-based products
    #[serde(default)]
    pub list: Option<String>,
    /// First hour for sub-daily variants
    #[serde(default)]
    pub start_hour: u32,
    /// Hours covered by sub-daily variants
    #[serde(default = "default_hours")]
    pub hours: u32,
    /// Naming conventions to try
    #[serde(default)]
    pub naming: NamingPreference,
}

fn default_enabled() -> bool {
    true
}

fn default_hours() -> u32 {
    24
}

/// Kinds whose `from` may use the `all` keywords
const ALL_KEYWORD_KINDS: [ProductKind; 6] = [
    ProductKind::Orbit,
    ProductKind::Clock,
    ProductKind::AttitudeExchange,
    ProductKind::DifferentialBias,
    ProductKind::ObservableBias,
    ProductKind::IonosphereMap,
];

/// One `+`-separated item of `from`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProviderToken {
    One(ProviderId),
    All(ProductLine),
}

impl ProductSection {
    /// Parse `from` without expanding keywords
    fn tokens(&self, kind: ProductKind) -> Result<Vec<ProviderToken>, ConfigError> {
        let field = format!("{kind}.from");
        let tokens = self
            .from
            .split('+')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let line = match part.to_ascii_lowercase().as_str() {
                    ALL_PROVIDERS_KEYWORD => Some(ProductLine::Final),
                    ALL_MGEX_PROVIDERS_KEYWORD => Some(ProductLine::Mgex),
                    _ => None,
                };
                match line {
                    Some(_) if !ALL_KEYWORD_KINDS.contains(&kind) => Err(invalid(
                        &field,
                        format!("'{part}' is not accepted for {kind}"),
                    )),
                    Some(line) => Ok(ProviderToken::All(line)),
                    None => ProviderId::parse(part)
                        .map(ProviderToken::One)
                        .map_err(|e| invalid(&field, e.to_string())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        if tokens.is_empty() {
            return Err(invalid(&field, "no provider given".to_string()));
        }
        Ok(tokens)
    }

    /// Providers named in `from`, keywords expanded against `catalog`,
    /// first occurrence kept
    pub fn providers(
        &self,
        kind: ProductKind,
        catalog: &ArchiveCatalog,
    ) -> Result<Vec<ProviderId>, ConfigError> {
        let mut providers = Vec::new();
        for token in self.tokens(kind)? {
            let expanded = match token {
                ProviderToken::One(provider) => vec![provider],
                ProviderToken::All(line) => catalog.all_providers(kind, line),
            };
            for provider in expanded {
                if !providers.contains(&provider) {
                    providers.push(provider);
                }
            }
        }
        Ok(providers)
    }

    /// Stations selected by `list`
    pub fn sites(&self) -> Result<SiteSelection, ConfigError> {
        match self.list.as_deref().map(str::trim) {
            None | Some("") => Ok(SiteSelection::All),
            Some(list) if list.eq_ignore_ascii_case("all") => Ok(SiteSelection::All),
            Some(list) => load_site_list(Path::new(list)).map(SiteSelection::Stations),
        }
    }
}

/// Stations requested for a station-based product
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteSelection {
    /// Every station the archive holds
    All,
    /// Listed stations, in file order
    Stations(Vec<StationCode>),
}

/// Read a site list: one code per line, `#` starts a comment
pub fn load_site_list(path: &Path) -> Result<Vec<StationCode>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_site_list(&text)
}

/// Parse site-list content
pub fn parse_site_list(text: &str) -> Result<Vec<StationCode>, ConfigError> {
    let mut stations: Vec<StationCode> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or("").trim();
        let Some(token) = content.split_whitespace().next() else {
            continue;
        };
        let station = StationCode::parse(token).map_err(|e| ConfigError::Invalid {
            field: format!("site list line {}", index + 1),
            reason: e.to_string(),
        })?;
        if !stations.contains(&station) {
            stations.push(station);
        }
    }
    Ok(stations)
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Main data directory
    pub main_dir: PathBuf,
    /// Per-kind sub-directory overrides
    #[serde(default)]
    pub subdirs: BTreeMap<ProductKind, PathBuf>,
    /// Processing period
    pub time: TimeWindow,
    /// Archive mirror (`cddis`, `ign` or `whu`)
    #[serde(default = "default_ftp")]
    pub ftp: String,
    /// Product sections
    #[serde(default)]
    pub products: BTreeMap<ProductKind, ProductSection>,
    /// Also fetch orbits and clocks of the adjacent days
    #[serde(default)]
    pub minus_add_1day: bool,
    /// Stitch each day's orbit with its neighbours
    #[serde(default)]
    pub merge_sp3: bool,
    /// External tool locations
    #[serde(default)]
    pub tools: ToolPaths,
}

fn default_ftp() -> String {
    "cddis".to_string()
}

impl RunConfig {
    /// Load and validate a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let payload = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&payload)
    }

    /// Parse and validate YAML content
    pub fn from_yaml(payload: &str) -> Result<Self, ConfigError> {
        let config: RunConfig =
            serde_yaml::from_str(payload).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and identifiers
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mirror()?;

        if !(1..=366).contains(&self.time.doy) {
            return Err(invalid("time.doy", format!("{} is not in 1..=366", self.time.doy)));
        }
        if self.time.ndays == 0 {
            return Err(invalid("time.ndays", "must be at least 1".to_string()));
        }

        for (kind, section) in &self.products {
            section.tokens(*kind)?;
            if section.start_hour > 23 {
                return Err(invalid(
                    &format!("{kind}.start_hour"),
                    format!("{} is not in 0..=23", section.start_hour),
                ));
            }
            if section.hours == 0 || section.hours > 24 {
                return Err(invalid(
                    &format!("{kind}.hours"),
                    format!("{} is not in 1..=24", section.hours),
                ));
            }
        }
        Ok(())
    }

    /// Selected mirror
    pub fn mirror(&self) -> Result<Mirror, ConfigError> {
        self.ftp.parse().map_err(|e: crate::identifier::IdentifierError| ConfigError::Invalid {
            field: "ftp".to_string(),
            reason: e.to_string(),
        })
    }

    /// First processing day
    pub fn start_epoch(&self) -> Epoch {
        Epoch::from_year_doy(normalize_year(self.time.year), self.time.doy)
    }

    /// Processing days, in order
    pub fn days(&self) -> Vec<Epoch> {
        let start = self.start_epoch();
        (0..self.time.ndays as i32).map(|d| start.add_days(d)).collect()
    }

    /// Directory layout with the configured overrides
    pub fn layout(&self) -> DirectoryLayout {
        self.subdirs
            .iter()
            .fold(DirectoryLayout::new(&self.main_dir), |layout, (kind, dir)| {
                layout.with_subdir(*kind, dir.clone())
            })
    }

    /// Enabled product sections
    pub fn enabled_products(&self) -> impl Iterator<Item = (ProductKind, &ProductSection)> {
        self.products
            .iter()
            .filter(|(_, section)| section.enabled)
            .map(|(kind, section)| (*kind, section))
    }
}

fn invalid(field: &str, reason: String) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason,
    }
}
