//! Product requests and acquisition outcomes

use crate::identifier::{ProviderId, StationCode};
use crate::resolver::Candidate;
use crate::time::Epoch;
use crate::{NamingPreference, ProductKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One logical artifact to acquire.
///
/// Station-based kinds without a station address every station the archive
/// holds for that epoch (bulk request).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRequest {
    /// Product kind
    pub kind: ProductKind,
    /// Epoch the artifact covers
    pub epoch: Epoch,
    /// Provider (analysis center or network)
    pub provider: ProviderId,
    /// Station, for station-based products
    pub station: Option<StationCode>,
    /// Catalog variant (sampling tag); `None` selects the default variant
    pub sampling_tag: Option<String>,
    /// Naming conventions to try
    pub naming: NamingPreference,
}

impl ProductRequest {
    /// Request the default variant of `kind` from `provider`
    pub fn new(kind: ProductKind, epoch: Epoch, provider: ProviderId) -> Self {
        Self {
            kind,
            epoch,
            provider,
            station: None,
            sampling_tag: None,
            naming: NamingPreference::default(),
        }
    }

    /// Set the station
    pub fn with_station(mut self, station: StationCode) -> Self {
        self.station = Some(station);
        self
    }

    /// Set the catalog variant
    pub fn with_sampling_tag(mut self, tag: impl Into<String>) -> Self {
        self.sampling_tag = Some(tag.into());
        self
    }

    /// Set the naming preference
    pub fn with_naming(mut self, naming: NamingPreference) -> Self {
        self.naming = naming;
        self
    }

    /// Short label used in logs and the audit trail
    pub fn label(&self) -> String {
        let mut label = format!("{} {}", self.kind, self.provider);
        if let Some(tag) = &self.sampling_tag {
            label.push_str(&format!(" {tag}"));
        }
        if let Some(station) = &self.station {
            label.push_str(&format!(" {station}"));
        }
        label
    }
}

/// Final state of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionStatus {
    /// Canonical artifact existed before the request; no tool was invoked
    AlreadyPresent,
    /// A candidate produced the canonical artifact
    Succeeded,
    /// Every candidate failed
    Failed,
}

impl AcquisitionStatus {
    /// Whether the artifact is available locally
    pub fn is_available(&self) -> bool {
        !matches!(self, AcquisitionStatus::Failed)
    }

    /// Lowercase label for metrics and output
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionStatus::AlreadyPresent => "already_present",
            AcquisitionStatus::Succeeded => "succeeded",
            AcquisitionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AcquisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one acquisition
#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionOutcome {
    /// The request this outcome answers
    pub request: ProductRequest,
    /// Candidate that produced the artifact
    pub matched_candidate: Option<Candidate>,
    /// Canonical local path, when the artifact is available
    pub local_path: Option<PathBuf>,
    /// Final status
    pub status: AcquisitionStatus,
    /// Every remote URL tried, in order
    pub remote_url_tried: Vec<String>,
    /// Per-file outcomes of a bulk fetch; empty otherwise
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discovered: Vec<AcquisitionOutcome>,
}

impl AcquisitionOutcome {
    pub(crate) fn already_present(request: &ProductRequest, local_path: PathBuf) -> Self {
        Self {
            request: request.clone(),
            matched_candidate: None,
            local_path: Some(local_path),
            status: AcquisitionStatus::AlreadyPresent,
            remote_url_tried: Vec::new(),
            discovered: Vec::new(),
        }
    }

    pub(crate) fn failed(request: &ProductRequest, remote_url_tried: Vec<String>) -> Self {
        Self {
            request: request.clone(),
            matched_candidate: None,
            local_path: None,
            status: AcquisitionStatus::Failed,
            remote_url_tried,
            discovered: Vec::new(),
        }
    }

    pub(crate) fn succeeded(
        request: &ProductRequest,
        candidate: Candidate,
        local_path: PathBuf,
        remote_url_tried: Vec<String>,
    ) -> Self {
        Self {
            request: request.clone(),
            matched_candidate: Some(candidate),
            local_path: Some(local_path),
            status: AcquisitionStatus::Succeeded,
            remote_url_tried,
            discovered: Vec::new(),
        }
    }

    /// Last URL tried, or the matched one on success
    pub fn last_url(&self) -> Option<&str> {
        self.remote_url_tried.last().map(String::as_str)
    }
}
