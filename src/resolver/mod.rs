//! Candidate resolution
//!
//! [`resolve`] turns a [`ProductRequest`] into the ordered list of remote
//! hypotheses the acquisition engine tries. The order is part of the
//! contract:
//!
//! 1. union members in catalog order (MGEX before the legacy IGS tree);
//! 2. within one source, long names before short names;
//! 3. within one name, the compression suffixes in catalog order.
//!
//! Resolution is pure: identical inputs give identical candidate lists.

pub mod template;

use crate::downloader::ProductRequest;
use crate::identifier::ProviderId;
use crate::registry::{ArchiveCatalog, CatalogEntry, Conversion};
use crate::{NamingPreference, NamingTag, ProductKind};
use serde::Serialize;
use template::{render, TemplateFields};
use tracing::debug;

/// Errors that can occur during resolution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// No catalog entry for the provider on the selected mirror
    #[error("unknown provider {provider} for {kind}{}", variant_suffix(.variant))]
    UnknownProvider {
        /// Requested product kind
        kind: ProductKind,
        /// Requested provider
        provider: ProviderId,
        /// Requested variant
        variant: Option<String>,
    },

    /// Malformed catalog template
    #[error("template error: {0}")]
    Template(String),
}

fn variant_suffix(variant: &Option<String>) -> String {
    variant.as_deref().map(|v| format!(" ({v})")).unwrap_or_default()
}

/// One remote location/name/compression hypothesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Remote directory URL, without trailing slash
    pub remote_base: String,
    /// Remote filename, possibly with `*` segments
    pub remote_name_pattern: String,
    /// Compression suffixes in try order (`""` means uncompressed)
    pub compression_suffixes: Vec<String>,
    /// Naming convention of `remote_name_pattern`
    pub naming_tag: NamingTag,
    /// Number of remote path segments below the host
    pub cut_path_depth: usize,
    /// Source the candidate belongs to (a union member for union requests)
    pub provider: ProviderId,
    /// Canonical local name; `*` when the name varies by center or station
    pub local_name: String,
    /// Conversion applied after decompression
    pub conversion: Option<Conversion>,
    /// Whether the candidate fetches every station at once
    pub bulk: bool,
    /// Offset of the station code inside matching remote names
    pub station_offset: Option<usize>,
}

impl Candidate {
    /// Full URL for one compression suffix
    pub fn url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.remote_base, self.remote_name_pattern, suffix)
    }

    /// Every URL this candidate may try, in order
    pub fn urls(&self) -> impl Iterator<Item = String> + '_ {
        self.compression_suffixes.iter().map(|s| self.url(s))
    }

    /// Whether the remote name contains a wildcard
    pub fn is_pattern(&self) -> bool {
        self.remote_name_pattern.contains('*')
    }
}

/// Resolve `request` against `catalog` into candidates in try order
pub fn resolve(
    request: &ProductRequest,
    catalog: &ArchiveCatalog,
) -> Result<Vec<Candidate>, ResolveError> {
    let entry = lookup(request, request.provider, request.sampling_tag.as_deref(), catalog)?;

    let candidates = collect(request, entry, catalog, request.naming)?;
    if !candidates.is_empty() {
        return Ok(candidates);
    }

    // preference names a convention the source does not publish
    debug!(
        request = %request.label(),
        naming = %request.naming,
        "no candidate for naming preference, using every convention"
    );
    collect(request, entry, catalog, NamingPreference::LongThenShort)
}

/// Canonical local name of `request` (may contain `*`)
pub fn local_name(request: &ProductRequest, catalog: &ArchiveCatalog) -> Result<String, ResolveError> {
    let entry = lookup(request, request.provider, request.sampling_tag.as_deref(), catalog)?;
    let fields = TemplateFields::new(
        &request.epoch,
        entry.anchor(),
        request.station.as_ref(),
        request.provider,
    );
    Ok(render(entry.local_template(), &fields)?.text)
}

fn collect(
    request: &ProductRequest,
    entry: &CatalogEntry,
    catalog: &ArchiveCatalog,
    naming: NamingPreference,
) -> Result<Vec<Candidate>, ResolveError> {
    if entry.union_of().is_empty() {
        return entry_candidates(request, entry, request.provider, catalog, naming);
    }
    let mut candidates = Vec::new();
    for member in entry.union_of() {
        let member_entry = lookup(request, *member, Some(entry.variant()), catalog)?;
        candidates.extend(entry_candidates(request, member_entry, *member, catalog, naming)?);
    }
    Ok(candidates)
}

fn lookup<'a>(
    request: &ProductRequest,
    provider: ProviderId,
    variant: Option<&str>,
    catalog: &'a ArchiveCatalog,
) -> Result<&'a CatalogEntry, ResolveError> {
    catalog
        .lookup(request.kind, provider, variant)
        .ok_or_else(|| ResolveError::UnknownProvider {
            kind: request.kind,
            provider,
            variant: variant.map(str::to_string),
        })
}

fn entry_candidates(
    request: &ProductRequest,
    entry: &CatalogEntry,
    provider: ProviderId,
    catalog: &ArchiveCatalog,
    naming: NamingPreference,
) -> Result<Vec<Candidate>, ResolveError> {
    let fields = TemplateFields::new(&request.epoch, entry.anchor(), request.station.as_ref(), provider);

    let base_template = catalog.base_template(entry).ok_or_else(|| ResolveError::UnknownProvider {
        kind: request.kind,
        provider,
        variant: Some(entry.variant().to_string()),
    })?;
    let remote_base = render(&base_template, &fields)?.text.trim_end_matches('/').to_string();
    let cut_path_depth = path_depth(&remote_base);
    let local_name = render(entry.local_template(), &fields)?.text;

    let variants: &[(NamingTag, Option<&str>)] = &[
        (NamingTag::Long, entry.long_template()),
        (NamingTag::Short, entry.short_template()),
    ];

    let mut candidates = Vec::new();
    for (tag, template) in variants {
        let Some(template) = template else { continue };
        if !naming_allows(naming, *tag) {
            continue;
        }
        let rendered = render(template, &fields)?;
        let bulk = rendered.has_station_wildcard(&fields);
        candidates.push(Candidate {
            remote_base: remote_base.clone(),
            remote_name_pattern: rendered.text.clone(),
            compression_suffixes: entry.compression_suffixes(),
            naming_tag: *tag,
            cut_path_depth,
            provider,
            local_name: local_name.clone(),
            conversion: entry.conversion(),
            bulk,
            station_offset: if bulk { rendered.fixed_station_offset() } else { None },
        });
    }
    Ok(candidates)
}

fn naming_allows(naming: NamingPreference, tag: NamingTag) -> bool {
    match naming {
        NamingPreference::LongOnly => tag == NamingTag::Long,
        NamingPreference::ShortOnly => tag == NamingTag::Short,
        NamingPreference::LongThenShort => true,
    }
}

/// Number of path segments after the host of a URL
fn path_depth(url: &str) -> usize {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme
        .split('/')
        .skip(1)
        .filter(|segment| !segment.is_empty())
        .count()
}
