//! Configuration loading, planning and plan execution

use super::fake_archive::FakeArchive;
use gnss_data_downloader::cli::run::{execute_plan, plan};
use gnss_data_downloader::cli::{OutputFormat, RunConfig};
use gnss_data_downloader::downloader::{AcquisitionEngine, RunContext};
use gnss_data_downloader::output::MemoryAuditSink;
use gnss_data_downloader::registry::ArchiveCatalog;
use gnss_data_downloader::shutdown::ShutdownCoordinator;
use gnss_data_downloader::{Mirror, ProductKind};
use std::fs;
use std::path::Path;

const IGS_PRODUCTS: &str = "ftps://gdc.cddis.eosdis.nasa.gov/gnss/products/2266";

fn sp3_day(tag: &str) -> String {
    format!("#dP2023 {tag}\n*  2023 {tag}\nPG01 {tag}\nEOF\n")
}

fn orbit_config(main_dir: &Path) -> RunConfig {
    let yaml = format!(
        "main_dir: {}\ntime: {{ year: 2023, doy: 166 }}\nmerge_sp3: true\nproducts:\n  orbit: {{ from: igs, naming: short }}\n",
        main_dir.display()
    );
    RunConfig::from_yaml(&yaml).unwrap()
}

#[test]
fn test_load_config_with_site_list() {
    let dir = tempfile::tempdir().unwrap();
    let sites = dir.path().join("sites.list");
    fs::write(&sites, "# IGS core\nALGO\nbjfs\nALGO\n").unwrap();
    let config_path = dir.path().join("run.yaml");
    fs::write(
        &config_path,
        format!(
            "main_dir: {}\nftp: whu\ntime: {{ year: 23, doy: 166, ndays: 2 }}\nsubdirs: {{ observation: rinex }}\nproducts:\n  observation: {{ from: igs, list: {} }}\n  navigation: {{ from: igs, enabled: false }}\n",
            dir.path().join("data").display(),
            sites.display()
        ),
    )
    .unwrap();

    let config = RunConfig::load(&config_path).unwrap();
    assert_eq!(config.mirror().unwrap(), Mirror::Whu);
    assert_eq!(config.days().len(), 2);
    assert_eq!(config.enabled_products().count(), 1);

    let catalog = ArchiveCatalog::embedded(Mirror::Whu).unwrap();
    let plan = plan(&config, &catalog).unwrap();
    let labels: Vec<String> = plan.requests.iter().map(|p| p.request.label()).collect();
    // two deduplicated stations on two days
    assert_eq!(labels.len(), 4);
    assert_eq!(labels[0], "observation igs algo");
    assert_eq!(labels[1], "observation igs bjfs");
    assert!(plan
        .requests
        .iter()
        .all(|p| p.dest == dir.path().join("data/rinex")));
    assert!(plan.stitches.is_empty());
}

#[test]
fn test_missing_config_file() {
    let err = RunConfig::load(Path::new("/nonexistent/run.yaml")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/run.yaml"));
}

#[test]
fn test_orbit_run_downloads_neighbours_and_stitches() {
    let main_dir = tempfile::tempdir().unwrap();
    let config = orbit_config(main_dir.path());
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let archive = FakeArchive::new();
    for (dow, tag) in [(3, "prior"), (4, "current"), (5, "next")] {
        archive.publish(&format!("{IGS_PRODUCTS}/igs2266{dow}.sp3.Z"), &sp3_day(tag));
    }
    let tools = archive.tools();
    let audit = MemoryAuditSink::default();
    let ctx = RunContext::new(&audit);

    let plan = plan(&config, &catalog).unwrap();
    assert_eq!(plan.requests.len(), 3);
    assert!(plan.requests.iter().all(|p| p.request.kind == ProductKind::Orbit));

    let summary = execute_plan(
        &plan,
        &AcquisitionEngine::new(&catalog, &tools),
        &ctx,
        OutputFormat::Json,
    )
    .unwrap();

    assert_eq!(summary.requested, 3);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.stitched, 1);
    assert!(!summary.interrupted);

    let orb = main_dir.path().join("orb");
    let merged = fs::read_to_string(orb.join("igs22664.sp3")).unwrap();
    assert_eq!(
        merged,
        "#dP2023 current\n*  2023 prior\nPG01 prior\n*  2023 current\nPG01 current\n*  2023 next\nPG01 next\nEOF\n"
    );
    assert!(orb.join("igs22664.sp3.orig").exists());

    // three downloads plus the stitch
    let lines = audit.lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[3].contains("stitched"));
}

#[test]
fn test_consecutive_days_splice_unmerged_neighbours() {
    let main_dir = tempfile::tempdir().unwrap();
    let yaml = format!(
        "main_dir: {}\ntime: {{ year: 2023, doy: 166, ndays: 2 }}\nmerge_sp3: true\nproducts:\n  orbit: {{ from: igs, naming: short }}\n",
        main_dir.path().display()
    );
    let config = RunConfig::from_yaml(&yaml).unwrap();
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let archive = FakeArchive::new();
    for (dow, tag) in [(3, "d165"), (4, "d166"), (5, "d167"), (6, "d168")] {
        archive.publish(&format!("{IGS_PRODUCTS}/igs2266{dow}.sp3.Z"), &sp3_day(tag));
    }
    let tools = archive.tools();
    let audit = MemoryAuditSink::default();

    let summary = execute_plan(
        &plan(&config, &catalog).unwrap(),
        &AcquisitionEngine::new(&catalog, &tools),
        &RunContext::new(&audit),
        OutputFormat::Json,
    )
    .unwrap();
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.stitched, 2);

    let records = |name: &str| -> Vec<String> {
        fs::read_to_string(main_dir.path().join("orb").join(name))
            .unwrap()
            .lines()
            .filter(|l| l.starts_with("PG01"))
            .map(str::to_string)
            .collect()
    };
    assert_eq!(records("igs22664.sp3"), vec!["PG01 d165", "PG01 d166", "PG01 d167"]);
    // day 166 was already spliced when day 167 read it
    assert_eq!(records("igs22665.sp3"), vec!["PG01 d166", "PG01 d167", "PG01 d168"]);
}

#[test]
fn test_rerun_is_already_present_and_keeps_backup() {
    let main_dir = tempfile::tempdir().unwrap();
    let config = orbit_config(main_dir.path());
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let archive = FakeArchive::new();
    for (dow, tag) in [(3, "prior"), (4, "current"), (5, "next")] {
        archive.publish(&format!("{IGS_PRODUCTS}/igs2266{dow}.sp3.Z"), &sp3_day(tag));
    }
    let tools = archive.tools();
    let audit = MemoryAuditSink::default();
    let ctx = RunContext::new(&audit);
    let engine = AcquisitionEngine::new(&catalog, &tools);
    let plan = plan(&config, &catalog).unwrap();

    execute_plan(&plan, &engine, &ctx, OutputFormat::Json).unwrap();
    let first = fs::read_to_string(main_dir.path().join("orb/igs22664.sp3")).unwrap();
    let fetched = archive.fetched_urls().len();

    let summary = execute_plan(&plan, &engine, &ctx, OutputFormat::Json).unwrap();
    assert_eq!(summary.already_present, 3);
    assert_eq!(archive.fetched_urls().len(), fetched);
    // the second splice starts again from the backup
    assert_eq!(
        fs::read_to_string(main_dir.path().join("orb/igs22664.sp3")).unwrap(),
        first
    );
}

#[test]
fn test_missing_neighbour_is_audited_not_fatal() {
    let main_dir = tempfile::tempdir().unwrap();
    let config = orbit_config(main_dir.path());
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let archive = FakeArchive::new();
    archive.publish(&format!("{IGS_PRODUCTS}/igs22664.sp3.Z"), &sp3_day("current"));
    let tools = archive.tools();
    let audit = MemoryAuditSink::default();

    let summary = execute_plan(
        &plan(&config, &catalog).unwrap(),
        &AcquisitionEngine::new(&catalog, &tools),
        &RunContext::new(&audit),
        OutputFormat::Json,
    )
    .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.stitched, 0);
    assert_eq!(
        fs::read_to_string(main_dir.path().join("orb/igs22664.sp3")).unwrap(),
        sp3_day("current")
    );
    assert!(audit.lines().last().unwrap().contains("not stitched"));
}

#[test]
fn test_cancelled_run_stops_before_first_request() {
    let main_dir = tempfile::tempdir().unwrap();
    let config = orbit_config(main_dir.path());
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let archive = FakeArchive::new();
    let tools = archive.tools();
    let audit = MemoryAuditSink::default();
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();
    let ctx = RunContext::new(&audit).with_shutdown(shutdown);

    let summary = execute_plan(
        &plan(&config, &catalog).unwrap(),
        &AcquisitionEngine::new(&catalog, &tools),
        &ctx,
        OutputFormat::Json,
    )
    .unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.requested, 0);
    assert!(archive.calls().is_empty());
    assert_eq!(audit.lines(), vec!["WARNING: run interrupted before completion".to_string()]);
}
