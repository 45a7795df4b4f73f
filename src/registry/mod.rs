//! Archive catalog of product locations
//!
//! The catalog maps `(product kind, provider, variant)` to a remote path
//! template and the long/short filename templates used on the IGS archive
//! mirrors. It is embedded in the binary as JSON, parsed once, and
//! materialised per [`Mirror`]: an entry with no path for the selected
//! mirror (and no `*` path) is not part of that mirror's catalog.

use crate::downloader::config::REALTIME_VARIANT;
use crate::identifier::{Mirror, ProductLine, ProviderId};
use crate::ProductKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Embedded catalog data
const CATALOG_JSON: &str = include_str!("catalog.json");

/// Parsed embedded catalog (loaded once, shared by every mirror view)
static CATALOG: Lazy<Result<RawCatalog, RegistryError>> =
    Lazy::new(|| RawCatalog::parse(CATALOG_JSON));

/// Key of a path that applies to every mirror
const ANY_MIRROR: &str = "*";

/// Read-only view of the catalog for one mirror
#[derive(Debug, Clone)]
pub struct ArchiveCatalog {
    mirror: Mirror,
    host: String,
    schema_version: String,
    entries: Vec<CatalogEntry>,
}

impl ArchiveCatalog {
    /// Embedded catalog for `mirror`
    pub fn embedded(mirror: Mirror) -> Result<Self, RegistryError> {
        let raw = CATALOG.as_ref().map_err(Clone::clone)?;
        Self::for_mirror(raw.clone(), mirror)
    }

    /// Parse a catalog from JSON and select `mirror`
    pub fn from_json(json: &str, mirror: Mirror) -> Result<Self, RegistryError> {
        Self::for_mirror(RawCatalog::parse(json)?, mirror)
    }

    fn for_mirror(raw: RawCatalog, mirror: Mirror) -> Result<Self, RegistryError> {
        let host = raw
            .hosts
            .get(mirror.key())
            .cloned()
            .ok_or_else(|| RegistryError::MissingHost(mirror.to_string()))?;

        let entries = raw
            .entries
            .into_iter()
            .filter(|entry| entry.is_available_on(mirror))
            .collect();

        Ok(Self {
            mirror,
            host: host.trim_end_matches('/').to_string(),
            schema_version: raw.schema_version,
            entries,
        })
    }

    /// Selected mirror
    pub fn mirror(&self) -> Mirror {
        self.mirror
    }

    /// Scheme and host of the selected mirror
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Catalog schema version
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// All entries available on this mirror
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Find the entry serving `provider` for `kind`.
    ///
    /// With no variant the entry flagged `default` wins, falling back to the
    /// first matching entry.
    pub fn lookup(
        &self,
        kind: ProductKind,
        provider: ProviderId,
        variant: Option<&str>,
    ) -> Option<&CatalogEntry> {
        let mut matching = self
            .entries
            .iter()
            .filter(|e| e.kind == kind && e.providers.contains(&provider));

        match variant {
            Some(v) => matching.find(|e| e.variant.eq_ignore_ascii_case(v)),
            None => {
                let candidates: Vec<&CatalogEntry> = matching.collect();
                candidates
                    .iter()
                    .find(|e| e.default)
                    .or_else(|| candidates.first())
                    .copied()
            }
        }
    }

    /// Providers that serve `kind` on this mirror, sorted
    pub fn providers(&self, kind: ProductKind) -> Vec<ProviderId> {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .flat_map(|e| e.providers.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Providers an `all` keyword stands for, in catalog order.
    ///
    /// Real-time, rapid and ultra-rapid products are never included. With
    /// [`ProductLine::Final`] an MGEX provider counts only when no IGS-line
    /// entry offers the same variant.
    pub fn all_providers(&self, kind: ProductKind, line: ProductLine) -> Vec<ProviderId> {
        let archived: Vec<&CatalogEntry> = self
            .entries
            .iter()
            .filter(|e| e.kind == kind && e.union_of.is_empty() && e.variant != REALTIME_VARIANT)
            .collect();
        let has_final_line = |variant: &str| {
            archived.iter().any(|e| {
                e.variant == variant && e.providers.iter().any(|p| p.line() == ProductLine::Final)
            })
        };

        let mut providers = Vec::new();
        for entry in &archived {
            for provider in &entry.providers {
                let keep = match line {
                    ProductLine::Mgex => provider.line() == ProductLine::Mgex,
                    _ => match provider.line() {
                        ProductLine::Final => true,
                        ProductLine::Mgex => !has_final_line(&entry.variant),
                        _ => false,
                    },
                };
                if keep && !providers.contains(provider) {
                    providers.push(*provider);
                }
            }
        }
        providers
    }

    /// Variant names available for `(kind, provider)`
    pub fn variants(&self, kind: ProductKind, provider: ProviderId) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.kind == kind && e.providers.contains(&provider))
            .map(|e| e.variant.as_str())
            .collect()
    }

    /// Remote base template of `entry` on this mirror, including the host
    /// unless the entry path is an absolute URL.
    pub fn base_template(&self, entry: &CatalogEntry) -> Option<String> {
        let path = entry.path_for(self.mirror)?;
        if path.contains("://") {
            Some(path.to_string())
        } else {
            Some(format!("{}/{}", self.host, path.trim_start_matches('/')))
        }
    }
}

/// Match `value` against a pattern where `*` matches any run of characters
pub fn matches_wildcard(pattern: &str, value: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let (Some((first, rest)), Some(last)) = (parts.split_first(), parts.last()) else {
        return false;
    };

    if !value.starts_with(first) {
        return false;
    }
    let mut pos = first.len();

    // Middle parts in order, leftmost match
    for part in &rest[..rest.len().saturating_sub(1)] {
        if part.is_empty() {
            continue;
        }
        match value[pos..].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    value.len() >= pos + last.len() && value.ends_with(last)
}

/// Format conversion applied after decompression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conversion {
    /// Hatanaka compact RINEX to full RINEX
    Crx2rnx,
}

/// Date the template fields are rendered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// The request epoch
    #[default]
    Epoch,
    /// Sunday of the request's GPS week
    WeekStart,
}

/// One catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    kind: ProductKind,
    providers: Vec<ProviderId>,
    variant: String,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    description: String,
    #[serde(default)]
    paths: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    long: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    short: Option<String>,
    local: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compression: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    convert: Option<Conversion>,
    #[serde(default)]
    anchor: Anchor,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    union_of: Vec<ProviderId>,
}

impl CatalogEntry {
    /// Product kind
    pub fn kind(&self) -> ProductKind {
        self.kind
    }

    /// Providers served by this entry
    pub fn providers(&self) -> &[ProviderId] {
        &self.providers
    }

    /// Variant (sampling tag) name
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Whether this is the default variant for its providers
    pub fn is_default(&self) -> bool {
        self.default
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Long filename template
    pub fn long_template(&self) -> Option<&str> {
        self.long.as_deref()
    }

    /// Short filename template
    pub fn short_template(&self) -> Option<&str> {
        self.short.as_deref()
    }

    /// Canonical local filename template (may contain `*`)
    pub fn local_template(&self) -> &str {
        &self.local
    }

    /// Compression suffixes in try order
    pub fn compression_suffixes(&self) -> Vec<String> {
        match &self.compression {
            Some(list) => list.clone(),
            None => crate::downloader::config::DEFAULT_COMPRESSION_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Conversion applied after decompression
    pub fn conversion(&self) -> Option<Conversion> {
        self.convert
    }

    /// Date anchor for template rendering
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Member providers of an observation union, in priority order
    pub fn union_of(&self) -> &[ProviderId] {
        &self.union_of
    }

    /// Path template for `mirror`
    pub fn path_for(&self, mirror: Mirror) -> Option<&str> {
        self.paths
            .get(mirror.key())
            .or_else(|| self.paths.get(ANY_MIRROR))
            .map(String::as_str)
    }

    fn is_available_on(&self, mirror: Mirror) -> bool {
        !self.union_of.is_empty() || self.path_for(mirror).is_some()
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let label = format!("{} {:?} {}", self.kind, self.providers, self.variant);
        if self.providers.is_empty() {
            return Err(RegistryError::InvalidEntry(format!("{label}: no providers")));
        }
        if self.variant.trim().is_empty() {
            return Err(RegistryError::InvalidEntry(format!("{label}: empty variant")));
        }
        if self.union_of.is_empty() {
            if self.paths.is_empty() {
                return Err(RegistryError::InvalidEntry(format!("{label}: no paths")));
            }
            if self.long.is_none() && self.short.is_none() {
                return Err(RegistryError::InvalidEntry(format!(
                    "{label}: neither long nor short template"
                )));
            }
        }
        Ok(())
    }
}

/// Raw catalog structure for deserialization
#[derive(Debug, Clone, Deserialize)]
struct RawCatalog {
    schema_version: String,
    #[allow(dead_code)]
    #[serde(default)]
    last_updated: String,
    hosts: BTreeMap<String, String>,
    entries: Vec<CatalogEntry>,
}

impl RawCatalog {
    fn parse(json: &str) -> Result<Self, RegistryError> {
        let raw: RawCatalog = serde_json::from_str(json)
            .map_err(|e| RegistryError::ParseError(format!("Failed to parse catalog: {e}")))?;
        for entry in &raw.entries {
            entry.validate()?;
        }
        Ok(raw)
    }
}

/// Errors that can occur when working with the catalog
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// Failed to parse catalog JSON
    #[error("catalog parse error: {0}")]
    ParseError(String),

    /// Structurally invalid entry
    #[error("invalid catalog entry: {0}")]
    InvalidEntry(String),

    /// Catalog lists no host for the mirror
    #[error("no host configured for mirror {0}")]
    MissingHost(String),
}
