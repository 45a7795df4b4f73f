//! Provider, station and mirror identifiers
//!
//! Free-form strings from the command line or the YAML run configuration are
//! parsed exactly once into these closed types. Past this boundary the core
//! never inspects raw provider strings.
//!
//! Provider codes follow the archive convention `ccc[_x]`, where `ccc` is the
//! analysis center (or observation network) and the optional suffix selects
//! the product line: `_m` MGEX final, `_r` rapid, `_u` ultra-rapid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur during identifier parsing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentifierError {
    /// Station code is not four alphanumeric characters
    #[error("invalid station code '{0}': expected 4 alphanumeric characters")]
    InvalidStation(String),

    /// Unknown analysis center or network
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// Unknown product line suffix
    #[error("unknown product line suffix in '{0}' (expected _m, _r or _u)")]
    UnknownProductLine(String),

    /// Unknown archive mirror
    #[error("unknown archive mirror '{0}' (expected cddis, ign or whu)")]
    UnknownMirror(String),
}

/// Four-character station (site) code, stored lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationCode(String);

impl StationCode {
    /// Parse a station code. Input is case-insensitive.
    ///
    /// ```
    /// use gnss_data_downloader::identifier::StationCode;
    ///
    /// let site = StationCode::parse("ALGO").unwrap();
    /// assert_eq!(site.lower(), "algo");
    /// assert_eq!(site.upper(), "ALGO");
    /// ```
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let trimmed = s.trim();
        if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IdentifierError::InvalidStation(s.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Lowercase form used by short filenames
    pub fn lower(&self) -> &str {
        &self.0
    }

    /// Uppercase form used by long filenames
    pub fn upper(&self) -> String {
        self.0.to_ascii_uppercase()
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StationCode {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationCode> for String {
    fn from(value: StationCode) -> Self {
        value.0
    }
}

/// Analysis centers and observation networks known to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Center {
    /// International GNSS Service
    Igs,
    /// IGS Multi-GNSS Experiment network
    Mgex,
    /// Union of MGEX and IGS observations
    Igm,
    /// Curtin University of Technology
    Cut,
    /// Hong Kong SatRef
    Hk,
    /// Plate Boundary Observatory (EarthScope)
    Pbo,
    /// Centro Sismologico Nacional, Universidad de Chile
    Chi,
    /// NOAA National Geodetic Survey CORS
    Ngs,
    /// EUREF Permanent Network
    Epn,
    /// German Aerospace Center
    Dlr,
    /// Institut national de l'information geographique
    Ign,
    /// Center for Orbit Determination in Europe
    Cod,
    /// Natural Resources Canada
    Emr,
    /// European Space Agency
    Esa,
    /// GeoForschungsZentrum Potsdam
    Gfz,
    /// CNES/CLS
    Grg,
    /// Jet Propulsion Laboratory
    Jpl,
    /// Massachusetts Institute of Technology
    Mit,
    /// Geodetic Observatory Pecny
    Jgx,
    /// Information-Analytical Center
    Iac,
    /// JAXA
    Jax,
    /// Shanghai Observatory
    Sha,
    /// Wuhan University
    Whu,
    /// Chinese Academy of Sciences
    Cas,
    /// Universitat Politecnica de Catalunya
    Upc,
    /// CNES real-time stream, offline files
    Cnt,
}

const CENTERS: &[(&str, Center)] = &[
    ("igs", Center::Igs),
    ("mgex", Center::Mgex),
    ("igm", Center::Igm),
    ("cut", Center::Cut),
    ("hk", Center::Hk),
    ("pbo", Center::Pbo),
    ("chi", Center::Chi),
    ("ngs", Center::Ngs),
    ("epn", Center::Epn),
    ("dlr", Center::Dlr),
    ("ign", Center::Ign),
    ("cod", Center::Cod),
    ("emr", Center::Emr),
    ("esa", Center::Esa),
    ("gfz", Center::Gfz),
    ("grg", Center::Grg),
    ("jpl", Center::Jpl),
    ("mit", Center::Mit),
    ("jgx", Center::Jgx),
    ("iac", Center::Iac),
    ("jax", Center::Jax),
    ("sha", Center::Sha),
    ("whu", Center::Whu),
    ("cas", Center::Cas),
    ("upc", Center::Upc),
    ("cnt", Center::Cnt),
];

impl Center {
    /// Lowercase code as it appears in short filenames
    pub fn code(&self) -> &'static str {
        CENTERS
            .iter()
            .find(|(_, c)| c == self)
            .map(|(code, _)| *code)
            .unwrap_or("igs")
    }
}

impl FromStr for Center {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        CENTERS
            .iter()
            .find(|(code, _)| *code == lower)
            .map(|(_, c)| *c)
            .ok_or_else(|| IdentifierError::UnknownProvider(s.to_string()))
    }
}

impl fmt::Display for Center {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Product line of an analysis-center product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductLine {
    /// IGS final (or the plain network for observations)
    #[default]
    Final,
    /// MGEX final
    Mgex,
    /// Rapid
    Rapid,
    /// Ultra-rapid
    UltraRapid,
}

impl ProductLine {
    fn suffix(&self) -> &'static str {
        match self {
            ProductLine::Final => "",
            ProductLine::Mgex => "_m",
            ProductLine::Rapid => "_r",
            ProductLine::UltraRapid => "_u",
        }
    }
}

/// A data provider: center plus product line.
///
/// # Examples
///
/// ```
/// use gnss_data_downloader::identifier::{Center, ProductLine, ProviderId};
///
/// let p = ProviderId::parse("cod_m").unwrap();
/// assert_eq!(p.center(), Center::Cod);
/// assert_eq!(p.line(), ProductLine::Mgex);
/// assert_eq!(p.to_string(), "cod_m");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderId {
    center: Center,
    line: ProductLine,
}

impl ProviderId {
    /// Build a provider from its parts
    pub fn new(center: Center, line: ProductLine) -> Self {
        Self { center, line }
    }

    /// Parse a provider code such as `igs`, `cod_m`, `gfz_r` or `igs_u`
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let lower = s.trim().to_ascii_lowercase();
        let (center, line) = match lower.split_once('_') {
            None => (lower.as_str(), ProductLine::Final),
            Some((center, suffix)) => {
                let line = match suffix {
                    "m" => ProductLine::Mgex,
                    "r" => ProductLine::Rapid,
                    "u" => ProductLine::UltraRapid,
                    _ => return Err(IdentifierError::UnknownProductLine(s.to_string())),
                };
                (center, line)
            }
        };
        let center = center
            .parse::<Center>()
            .map_err(|_| IdentifierError::UnknownProvider(s.to_string()))?;
        Ok(Self { center, line })
    }

    /// Parse a `+`-joined provider list (`cod+gfz_m+igs`), preserving order
    pub fn parse_list(s: &str) -> Result<Vec<Self>, IdentifierError> {
        s.split('+')
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Analysis center or network
    pub fn center(&self) -> Center {
        self.center
    }

    /// Product line
    pub fn line(&self) -> ProductLine {
        self.line
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.center.code(), self.line.suffix())
    }
}

impl FromStr for ProviderId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProviderId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProviderId> for String {
    fn from(value: ProviderId) -> Self {
        value.to_string()
    }
}

/// Archive mirror hosting the IGS data and product trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mirror {
    /// NASA CDDIS
    Cddis,
    /// IGN France
    Ign,
    /// Wuhan University
    Whu,
}

impl Mirror {
    /// Lowercase key used in the catalog
    pub fn key(&self) -> &'static str {
        match self {
            Mirror::Cddis => "cddis",
            Mirror::Ign => "ign",
            Mirror::Whu => "whu",
        }
    }
}

impl FromStr for Mirror {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cddis" => Ok(Mirror::Cddis),
            "ign" => Ok(Mirror::Ign),
            "whu" => Ok(Mirror::Whu),
            _ => Err(IdentifierError::UnknownMirror(s.to_string())),
        }
    }
}

impl fmt::Display for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
