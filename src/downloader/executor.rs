//! Acquisition engine
//!
//! One request runs through a fixed sequence:
//!
//! 1. **CheckLocal**: a non-empty file under the canonical name means
//!    `AlreadyPresent`, and no tool is invoked.
//! 2. **TryCandidates**: candidates are tried in resolver order. For each
//!    compression suffix the transfer tool is invoked until a local file
//!    appears. That file is decompressed, converted or renamed to the
//!    canonical name and verified. The first candidate that verifies wins.
//! 3. **Exhausted**: no candidate verified, so the status is `Failed`.
//!
//! Intermediates are removed after every candidate. A partial file left
//! under the canonical name would make the next run report it as present.
//!
//! A bulk candidate (station-based product with no station) fetches every
//! matching remote file in one transfer. Each discovered file then gets
//! its own outcome, nested in one aggregate outcome.

use super::job::{AcquisitionOutcome, AcquisitionStatus, ProductRequest};
use super::{config, AcquireError, RunContext};
use crate::fetcher::{ExternalTools, TransferRequest};
use crate::identifier::StationCode;
use crate::metrics::AcquisitionMetrics;
use crate::output::{find_existing, list_matching, sanitize_file_name, AuditLevel};
use crate::registry::{ArchiveCatalog, Conversion};
use crate::resolver::{self, Candidate};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Executes product requests against one catalog with one tool set
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionEngine<'a> {
    catalog: &'a ArchiveCatalog,
    tools: &'a ExternalTools,
}

impl<'a> AcquisitionEngine<'a> {
    /// Create an engine
    pub fn new(catalog: &'a ArchiveCatalog, tools: &'a ExternalTools) -> Self {
        Self { catalog, tools }
    }

    /// Catalog in use
    pub fn catalog(&self) -> &ArchiveCatalog {
        self.catalog
    }

    /// Acquire `request` into `dest_dir`.
    ///
    /// Only resolution and local I/O problems are errors; an artifact that
    /// no candidate could produce is an `Ok` outcome with status `Failed`.
    pub fn acquire(
        &self,
        request: &ProductRequest,
        dest_dir: &Path,
        ctx: &RunContext<'_>,
    ) -> Result<AcquisitionOutcome, AcquireError> {
        let metrics = AcquisitionMetrics::start(request.kind);
        let candidates = resolver::resolve(request, self.catalog)?;
        let local_name = sanitize_file_name(&resolver::local_name(request, self.catalog)?);

        fs::create_dir_all(dest_dir).map_err(|e| {
            AcquireError::Io(format!("Failed to create {}: {e}", dest_dir.display()))
        })?;

        if candidates.iter().any(|c| c.bulk) {
            let outcome = self.acquire_bulk(request, &candidates, dest_dir, ctx, &metrics)?;
            metrics.record_outcome(outcome.status);
            return Ok(outcome);
        }

        if let Some(existing) = find_existing(dest_dir, &local_name) {
            debug!(request = %request.label(), path = %existing.display(), "already present");
            let outcome = AcquisitionOutcome::already_present(request, existing);
            self.report(&outcome, &local_name, ctx)?;
            metrics.record_outcome(outcome.status);
            return Ok(outcome);
        }

        let mut tried = Vec::new();
        for candidate in &candidates {
            if let Some(path) = self.try_candidate(candidate, &local_name, dest_dir, &mut tried, ctx, &metrics) {
                let outcome = AcquisitionOutcome::succeeded(request, candidate.clone(), path, tried);
                self.report(&outcome, &local_name, ctx)?;
                metrics.record_outcome(outcome.status);
                return Ok(outcome);
            }
        }

        let outcome = AcquisitionOutcome::failed(request, tried);
        self.report(&outcome, &local_name, ctx)?;
        metrics.record_outcome(outcome.status);
        Ok(outcome)
    }

    /// Fetch with every suffix of `candidate` until a file appears, then
    /// finish it. Returns the canonical path on success.
    fn try_candidate(
        &self,
        candidate: &Candidate,
        local_name: &str,
        dest_dir: &Path,
        tried: &mut Vec<String>,
        ctx: &RunContext<'_>,
        metrics: &AcquisitionMetrics,
    ) -> Option<PathBuf> {
        for suffix in &candidate.compression_suffixes {
            let url = candidate.url(suffix);
            tried.push(url.clone());
            metrics.record_attempt();
            self.transfer(&url, candidate.cut_path_depth, dest_dir, ctx);

            let fetched_pattern = format!("{}{}", candidate.remote_name_pattern, suffix);
            let Some(fetched) = list_matching(dest_dir, &fetched_pattern).into_iter().next() else {
                continue;
            };

            // first suffix that produced a file decides this candidate
            return match self.finish(&fetched, suffix, candidate, local_name, dest_dir) {
                Ok(path) => Some(path),
                Err(reason) => {
                    debug!(%url, %reason, "candidate failed after transfer");
                    None
                }
            };
        }
        None
    }

    fn transfer(&self, url: &str, cut_dirs: usize, dest_dir: &Path, ctx: &RunContext<'_>) {
        if ctx.is_verbose() {
            info!(%url, "trying");
        } else {
            debug!(%url, "trying");
        }

        let request = TransferRequest {
            url,
            cut_dirs,
            work_dir: dest_dir,
        };
        if let Err(e) = self.tools.transfer().fetch(&request) {
            if e.is_launch_failure() {
                warn!(%url, error = %e, "transfer tool could not be launched");
            } else {
                debug!(%url, error = %e, "transfer tool reported failure");
            }
        }
    }

    /// Decompress, convert or rename and verify one fetched file.
    ///
    /// On any failure every intermediate is removed.
    fn finish(
        &self,
        fetched: &Path,
        suffix: &str,
        candidate: &Candidate,
        local_name: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, String> {
        let decompressed = strip_suffix(fetched, suffix);
        let target = if local_name.contains('*') {
            decompressed.clone()
        } else {
            dest_dir.join(local_name)
        };

        let result = self.finish_steps(fetched, &decompressed, &target, suffix, candidate);
        // intermediates never survive, whatever the result
        if fetched != target.as_path() {
            remove_quietly(fetched);
        }
        if decompressed != target {
            remove_quietly(&decompressed);
        }
        if result.is_err() {
            remove_quietly(&target);
        }
        result.map(|_| target)
    }

    fn finish_steps(
        &self,
        fetched: &Path,
        decompressed: &Path,
        target: &Path,
        suffix: &str,
        candidate: &Candidate,
    ) -> Result<(), String> {
        if !suffix.is_empty() {
            if let Err(e) = self.tools.decompress().decompress(fetched) {
                debug!(path = %fetched.display(), error = %e, "decompress reported failure");
            }
            if !decompressed.is_file() {
                return Err(format!("{} not produced by decompression", decompressed.display()));
            }
        }

        match candidate.conversion {
            Some(Conversion::Crx2rnx) if decompressed != target => {
                if let Err(e) = self.tools.convert().convert(decompressed, target) {
                    return Err(format!("conversion failed: {e}"));
                }
            }
            _ if decompressed != target => {
                fs::rename(decompressed, target)
                    .map_err(|e| format!("rename to {} failed: {e}", target.display()))?;
            }
            _ => {}
        }

        let non_empty = fs::metadata(target).map(|m| m.len() > 0).unwrap_or(false);
        if !non_empty {
            return Err(format!("{} missing or empty", target.display()));
        }
        Ok(())
    }

    fn acquire_bulk(
        &self,
        request: &ProductRequest,
        candidates: &[Candidate],
        dest_dir: &Path,
        ctx: &RunContext<'_>,
        metrics: &AcquisitionMetrics,
    ) -> Result<AcquisitionOutcome, AcquireError> {
        let mut tried = Vec::new();
        let mut discovered: Vec<AcquisitionOutcome> = Vec::new();
        let mut seen = BTreeSet::new();
        let mut matched = None;

        for candidate in candidates {
            for suffix in &candidate.compression_suffixes {
                let before: BTreeSet<PathBuf> = list_matching(dest_dir, "*").into_iter().collect();
                let url = candidate.url(suffix);
                tried.push(url.clone());
                metrics.record_attempt();
                self.transfer(&url, candidate.cut_path_depth, dest_dir, ctx);

                let pattern = format!("{}{}", candidate.remote_name_pattern, suffix);
                let fetched: Vec<PathBuf> = list_matching(dest_dir, &pattern)
                    .into_iter()
                    .filter(|p| !before.contains(p))
                    .collect();
                if fetched.is_empty() {
                    continue;
                }
                info!(%url, files = fetched.len(), "bulk transfer");

                for file in fetched {
                    if let Some(outcome) =
                        self.finish_discovered(request, candidate, &file, suffix, dest_dir, &mut seen, ctx)?
                    {
                        discovered.push(outcome);
                    }
                }
                matched.get_or_insert_with(|| candidate.clone());
                break;
            }
        }

        let any_available = discovered.iter().any(|o| o.status.is_available());
        let mut aggregate = if any_available {
            AcquisitionOutcome {
                request: request.clone(),
                matched_candidate: matched,
                local_path: Some(dest_dir.to_path_buf()),
                status: AcquisitionStatus::Succeeded,
                remote_url_tried: tried,
                discovered: Vec::new(),
            }
        } else {
            AcquisitionOutcome::failed(request, tried)
        };
        aggregate.discovered = discovered;

        let available = aggregate.discovered.iter().filter(|o| o.status.is_available()).count();
        let message = format!(
            "{} bulk fetch into {}: {} of {} discovered files available, last URL {}",
            request.label(),
            dest_dir.display(),
            available,
            aggregate.discovered.len(),
            aggregate.last_url().unwrap_or("-"),
        );
        let level = if any_available { AuditLevel::Info } else { AuditLevel::Warning };
        ctx.audit().append(level, &message)?;
        if any_available {
            info!(request = %request.label(), available, "bulk fetch complete");
        } else {
            warn!(request = %request.label(), "bulk fetch found nothing");
        }
        Ok(aggregate)
    }

    /// Outcome for one file of a bulk transfer; `None` if its station was
    /// already handled by an earlier candidate.
    #[allow(clippy::too_many_arguments)]
    fn finish_discovered(
        &self,
        request: &ProductRequest,
        candidate: &Candidate,
        file: &Path,
        suffix: &str,
        dest_dir: &Path,
        seen: &mut BTreeSet<StationCode>,
        ctx: &RunContext<'_>,
    ) -> Result<Option<AcquisitionOutcome>, AcquireError> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let url = format!("{}/{}", candidate.remote_base, name);

        let Some(station) = station_from_name(&name, candidate.station_offset) else {
            warn!(file = %name, "cannot derive a station code, discarding");
            remove_quietly(file);
            return Ok(None);
        };
        if !seen.insert(station.clone()) {
            remove_quietly(file);
            return Ok(None);
        }

        let station_request = request.clone().with_station(station);
        let local_name = sanitize_file_name(&resolver::local_name(&station_request, self.catalog)?);

        let outcome = if let Some(existing) = find_existing(dest_dir, &local_name) {
            remove_quietly(file);
            AcquisitionOutcome::already_present(&station_request, existing)
        } else {
            match self.finish(file, suffix, candidate, &local_name, dest_dir) {
                Ok(path) => AcquisitionOutcome::succeeded(&station_request, candidate.clone(), path, vec![url]),
                Err(reason) => {
                    debug!(file = %name, %reason, "discovered file failed");
                    AcquisitionOutcome::failed(&station_request, vec![url])
                }
            }
        };
        self.report(&outcome, &local_name, ctx)?;
        Ok(Some(outcome))
    }

    /// One audit line and one console trace per outcome
    fn report(
        &self,
        outcome: &AcquisitionOutcome,
        local_name: &str,
        ctx: &RunContext<'_>,
    ) -> Result<(), AcquireError> {
        let label = outcome.request.label();
        let url = outcome.last_url().unwrap_or("-");
        match outcome.status {
            AcquisitionStatus::AlreadyPresent => {
                info!(request = %label, local = %local_name, "already present");
                ctx.audit().append(
                    AuditLevel::Info,
                    &format!("{label}: {local_name} already present, not downloaded"),
                )?;
            }
            AcquisitionStatus::Succeeded => {
                info!(request = %label, local = %local_name, %url, "acquired");
                ctx.audit().append(
                    AuditLevel::Info,
                    &format!("{label}: {local_name} downloaded from {url}"),
                )?;
            }
            AcquisitionStatus::Failed => {
                warn!(
                    request = %label,
                    local = %local_name,
                    attempts = outcome.remote_url_tried.len(),
                    "all candidates failed"
                );
                ctx.audit().append(
                    AuditLevel::Warning,
                    &format!(
                        "{label}: {local_name} not acquired after {} URL(s), last {url}",
                        outcome.remote_url_tried.len()
                    ),
                )?;
            }
        }
        Ok(())
    }
}

/// Station code embedded in a discovered remote name
fn station_from_name(name: &str, offset: Option<usize>) -> Option<StationCode> {
    let start = offset.unwrap_or(0);
    let code = name.get(start..start + config::STATION_CODE_LEN)?;
    StationCode::parse(code).ok()
}

fn strip_suffix(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stripped = name.strip_suffix(suffix).unwrap_or(&name);
    path.with_file_name(stripped)
}

fn remove_quietly(path: &Path) {
    if path.is_file() {
        if let Err(e) = fs::remove_file(path) {
            debug!(path = %path.display(), error = %e, "could not remove intermediate");
        }
    }
}
