//! `run` command: the day/product loop
//!
//! The configuration is expanded into a flat [`RunPlan`] first, so the
//! loop itself only acquires, reports and stitches.

use super::config::{ProductSection, RunConfig, SiteSelection};
use super::{Cli, CliError, OutputFormat};
use crate::downloader::config::{AUDIT_LOG_NAME, HIGHRATE_STEP_MINUTES, ULTRA_RAPID_STEP_HOURS};
use crate::downloader::{AcquisitionEngine, AcquisitionOutcome, AcquisitionStatus, ProductRequest, RunContext};
use crate::fetcher::ExternalTools;
use crate::identifier::ProviderId;
use crate::output::{AuditLevel, FileAuditSink, RunLock};
use crate::registry::ArchiveCatalog;
use crate::resolver;
use crate::shutdown::SharedShutdown;
use crate::stitch::{self, SpliceMarkers};
use crate::time::Epoch;
use crate::ProductKind;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Run arguments
#[derive(Debug, Args)]
pub struct RunArgs {
    /// YAML run configuration
    #[arg(long, short)]
    pub config: PathBuf,
}

/// One request and where its artifact goes
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRequest {
    /// The request
    pub request: ProductRequest,
    /// Destination directory
    pub dest: PathBuf,
}

/// Three adjacent orbit days to splice after acquisition
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStitch {
    /// Provider whose orbits are spliced
    pub provider: ProviderId,
    /// Middle day
    pub day: Epoch,
    /// Variant of the orbit section
    pub variant: Option<String>,
    /// Naming preference of the orbit section
    pub naming: crate::NamingPreference,
    /// Orbit directory
    pub dest: PathBuf,
}

/// Everything a run will do, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunPlan {
    /// Requests, deduplicated, in issue order
    pub requests: Vec<PlannedRequest>,
    /// Stitches performed after all requests
    pub stitches: Vec<PlannedStitch>,
}

impl RunPlan {
    fn push(&mut self, request: ProductRequest, dest: &Path) {
        let planned = PlannedRequest {
            request,
            dest: dest.to_path_buf(),
        };
        if !self.requests.contains(&planned) {
            self.requests.push(planned);
        }
    }
}

/// Expand a configuration into requests
pub fn plan(config: &RunConfig, catalog: &ArchiveCatalog) -> Result<RunPlan, CliError> {
    let layout = config.layout();
    let mut plan = RunPlan::default();

    for day in config.days() {
        for (kind, section) in config.enabled_products() {
            let dest = layout.dir_for(kind);
            let sites = if kind.is_station_based() {
                section.sites()?
            } else {
                SiteSelection::All
            };
            let adjacent = matches!(kind, ProductKind::Orbit | ProductKind::Clock)
                && (config.minus_add_1day || config.merge_sp3);

            for provider in section.providers(kind, catalog)? {
                let variant = effective_variant(catalog, kind, provider, section);
                let epochs = sub_daily_epochs(day, variant.as_deref(), section);
                let daily = epochs.len() == 1;
                let days: Vec<Epoch> = if adjacent && daily {
                    vec![day.add_days(-1), day, day.add_days(1)]
                } else {
                    epochs
                };

                for epoch in days {
                    for request in section_requests(kind, epoch, provider, section, &sites) {
                        plan.push(request, &dest);
                    }
                }

                if kind == ProductKind::Orbit && config.merge_sp3 && daily {
                    plan.stitches.push(PlannedStitch {
                        provider,
                        day,
                        variant: section.variant.clone(),
                        naming: section.naming,
                        dest: dest.clone(),
                    });
                }
            }
        }
    }
    Ok(plan)
}

fn section_requests(
    kind: ProductKind,
    epoch: Epoch,
    provider: ProviderId,
    section: &ProductSection,
    sites: &SiteSelection,
) -> Vec<ProductRequest> {
    let mut base = ProductRequest::new(kind, epoch, provider).with_naming(section.naming);
    if let Some(variant) = &section.variant {
        base = base.with_sampling_tag(variant.clone());
    }
    match sites {
        SiteSelection::All => vec![base],
        SiteSelection::Stations(stations) => stations
            .iter()
            .map(|station| base.clone().with_station(station.clone()))
            .collect(),
    }
}

/// Variant the catalog will pick for this section
fn effective_variant(
    catalog: &ArchiveCatalog,
    kind: ProductKind,
    provider: ProviderId,
    section: &ProductSection,
) -> Option<String> {
    catalog
        .lookup(kind, provider, section.variant.as_deref())
        .map(|entry| entry.variant().to_string())
        .or_else(|| section.variant.clone())
}

/// Epochs of one day for a variant: the day itself, or its hourly,
/// quarter-hourly or six-hourly issues within the configured hours
pub fn sub_daily_epochs(day: Epoch, variant: Option<&str>, section: &ProductSection) -> Vec<Epoch> {
    let (step_minutes, aligned_start) = match variant {
        Some("hourly") => (60, section.start_hour),
        Some("highrate") => (HIGHRATE_STEP_MINUTES, section.start_hour),
        Some("ultra") => (
            ULTRA_RAPID_STEP_HOURS * 60,
            section.start_hour - section.start_hour % ULTRA_RAPID_STEP_HOURS,
        ),
        _ => return vec![day.start_of_day()],
    };

    let end_minute = ((section.start_hour + section.hours).min(24)) * 60;
    let mut epochs = Vec::new();
    let mut minute = aligned_start * 60;
    while minute < end_minute {
        epochs.push(day.start_of_day().add_seconds(f64::from(minute * 60)));
        minute += step_minutes;
    }
    epochs
}

/// Counts of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Requests issued
    pub requested: usize,
    /// Artifacts found locally
    pub already_present: usize,
    /// Artifacts fetched
    pub succeeded: usize,
    /// Artifacts no candidate produced
    pub failed: usize,
    /// Requests rejected before acquisition
    pub errors: usize,
    /// Orbit files stitched
    pub stitched: usize,
    /// Whether Ctrl+C stopped the run early
    pub interrupted: bool,
}

impl RunSummary {
    fn record(&mut self, outcome: &AcquisitionOutcome) {
        let outcomes: Vec<&AcquisitionOutcome> = if outcome.discovered.is_empty() {
            vec![outcome]
        } else {
            outcome.discovered.iter().collect()
        };
        for o in outcomes {
            match o.status {
                AcquisitionStatus::AlreadyPresent => self.already_present += 1,
                AcquisitionStatus::Succeeded => self.succeeded += 1,
                AcquisitionStatus::Failed => self.failed += 1,
            }
        }
    }
}

impl RunArgs {
    /// Execute the run
    pub fn execute(&self, cli: &Cli, shutdown: SharedShutdown) -> Result<RunSummary, CliError> {
        let mut config = RunConfig::load(&self.config)?;
        if let Some(dir) = &cli.data_dir {
            config.main_dir = dir.clone();
        }

        let catalog = ArchiveCatalog::embedded(config.mirror()?)?;
        let tools = ExternalTools::from_paths(&config.tools);

        std::fs::create_dir_all(&config.main_dir)
            .map_err(|e| CliError::Io(format!("Failed to create {}: {e}", config.main_dir.display())))?;
        let _lock = RunLock::try_acquire(&config.main_dir)?;
        let audit = FileAuditSink::open(config.main_dir.join(AUDIT_LOG_NAME))?;
        let ctx = RunContext::new(&audit)
            .with_verbosity(cli.verbose)
            .with_shutdown(shutdown);

        let plan = plan(&config, &catalog)?;
        info!(
            mirror = %catalog.mirror(),
            requests = plan.requests.len(),
            stitches = plan.stitches.len(),
            "Starting run"
        );

        let summary = execute_plan(&plan, &AcquisitionEngine::new(&catalog, &tools), &ctx, cli.output_format)?;
        print_summary(&summary, cli.output_format);
        Ok(summary)
    }
}

/// Acquire every planned request, then stitch
pub fn execute_plan(
    plan: &RunPlan,
    engine: &AcquisitionEngine<'_>,
    ctx: &RunContext<'_>,
    format: OutputFormat,
) -> Result<RunSummary, CliError> {
    let mut summary = RunSummary::default();
    let mut produced: HashMap<(ProviderId, i32), PathBuf> = HashMap::new();
    let progress = create_progress_bar(plan.requests.len() as u64, format);

    for planned in &plan.requests {
        if ctx.is_cancelled() {
            warn!("Shutdown requested, stopping before the next request");
            ctx.audit()
                .append(AuditLevel::Warning, "run interrupted before completion")?;
            summary.interrupted = true;
            break;
        }

        let request = &planned.request;
        progress.set_message(request.label());
        summary.requested += 1;

        match engine.acquire(request, &planned.dest, ctx) {
            Ok(outcome) => {
                summary.record(&outcome);
                if let (ProductKind::Orbit, Some(path)) = (request.kind, &outcome.local_path) {
                    produced.insert((request.provider, request.epoch.day_count()), path.clone());
                }
            }
            Err(e) => {
                // one bad request never stops the loop
                error!(request = %request.label(), error = %e, "Request rejected");
                ctx.audit()
                    .append(AuditLevel::Warning, &format!("{}: {e}", request.label()))?;
                summary.errors += 1;
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if summary.interrupted {
        return Ok(summary);
    }

    for planned in &plan.stitches {
        let paths = [-1, 0, 1].map(|offset| {
            let day = planned.day.add_days(offset);
            produced
                .get(&(planned.provider, day.day_count()))
                .cloned()
                .unwrap_or_else(|| expected_orbit_path(engine.catalog(), planned, day))
        });
        match stitch::stitch([&paths[0], &paths[1], &paths[2]], &SpliceMarkers::default()) {
            Ok(true) => {
                summary.stitched += 1;
                ctx.audit().append(
                    AuditLevel::Info,
                    &format!("orbit {} stitched with adjacent days", paths[1].display()),
                )?;
            }
            Ok(false) => {
                ctx.audit().append(
                    AuditLevel::Warning,
                    &format!("orbit {} not stitched, adjacent day missing", paths[1].display()),
                )?;
            }
            Err(e) => {
                error!(file = %paths[1].display(), error = %e, "Stitch failed");
                ctx.audit().append(
                    AuditLevel::Warning,
                    &format!("orbit {} stitch failed: {e}", paths[1].display()),
                )?;
            }
        }
    }

    Ok(summary)
}

/// Canonical orbit path of a day that produced no outcome
fn expected_orbit_path(catalog: &ArchiveCatalog, planned: &PlannedStitch, day: Epoch) -> PathBuf {
    let mut request = ProductRequest::new(ProductKind::Orbit, day, planned.provider)
        .with_naming(planned.naming);
    if let Some(variant) = &planned.variant {
        request = request.with_sampling_tag(variant.clone());
    }
    let name = resolver::local_name(&request, catalog).unwrap_or_else(|_| request.label());
    planned.dest.join(name)
}

fn create_progress_bar(total: u64, format: OutputFormat) -> ProgressBar {
    if matches!(format, OutputFormat::Json) {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn print_summary(summary: &RunSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string(summary) {
            Ok(json) => println!("{json}"),
            Err(e) => error!(error = %e, "Failed to serialize summary"),
        },
        OutputFormat::Human => {
            println!("\nRun {}", if summary.interrupted { "interrupted" } else { "completed" });
            println!("Requests: {}", summary.requested);
            println!("Already present: {}", summary.already_present);
            println!("Downloaded: {}", summary.succeeded);
            println!("Failed: {}", summary.failed);
            if summary.errors > 0 {
                println!("Rejected: {}", summary.errors);
            }
            if summary.stitched > 0 {
                println!("Stitched: {}", summary.stitched);
            }
        }
    }
}
