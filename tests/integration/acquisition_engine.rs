//! Acquisition engine against a fake archive

use super::fake_archive::{dir_listing, FakeArchive};
use gnss_data_downloader::downloader::{AcquisitionEngine, AcquisitionStatus, ProductRequest, RunContext};
use gnss_data_downloader::output::MemoryAuditSink;
use gnss_data_downloader::registry::ArchiveCatalog;
use gnss_data_downloader::{
    CalendarDate, Mirror, NamingPreference, NamingTag, ProductKind, ProviderId, StationCode,
};
use std::fs;

const CDDIS_NAV: &str = "ftps://gdc.cddis.eosdis.nasa.gov/gnss/data/daily/2023/166/23n";

fn nav_request() -> ProductRequest {
    ProductRequest::new(
        ProductKind::Navigation,
        CalendarDate::ymd(2023, 6, 15).unwrap().to_epoch(),
        ProviderId::parse("igs").unwrap(),
    )
    .with_naming(NamingPreference::LongThenShort)
}

#[test]
fn test_navigation_scenario_fails_after_four_urls() {
    let archive = FakeArchive::new();
    let tools = archive.tools();
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let dest = tempfile::tempdir().unwrap();
    let audit = MemoryAuditSink::default();
    let ctx = RunContext::new(&audit);

    let outcome = AcquisitionEngine::new(&catalog, &tools)
        .acquire(&nav_request(), dest.path(), &ctx)
        .unwrap();

    assert_eq!(outcome.status, AcquisitionStatus::Failed);
    assert_eq!(
        outcome.remote_url_tried,
        vec![
            format!("{CDDIS_NAV}/BRDC00IGS_R_20231660000_01D_GN.rnx.gz"),
            format!("{CDDIS_NAV}/BRDC00IGS_R_20231660000_01D_GN.rnx.Z"),
            format!("{CDDIS_NAV}/brdc1660.23n.gz"),
            format!("{CDDIS_NAV}/brdc1660.23n.Z"),
        ]
    );
    assert_eq!(archive.fetched_urls(), outcome.remote_url_tried);
    assert!(outcome.local_path.is_none());

    let lines = audit.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("WARNING:"));
    assert!(lines[0].contains("brdc1660.23n"));
    assert!(lines[0].contains("brdc1660.23n.Z"));
    assert!(dir_listing(dest.path()).is_empty());
}

#[test]
fn test_short_name_fallback_with_single_suffix() {
    let catalog_json = r#"{
      "schema_version": "1.0",
      "hosts": { "cddis": "ftp://archive.test" },
      "entries": [{
        "kind": "navigation",
        "providers": ["igs"],
        "variant": "gps",
        "default": true,
        "paths": { "*": "/nav/{YYYY}/{DDD}" },
        "long": "BRDC00IGS_R_{YYYY}{DDD}0000_01D_GN.rnx",
        "short": "brdc{DDD}0.{YY}n",
        "local": "brdc{DDD}0.{YY}n",
        "compression": [".gz"]
      }]
    }"#;
    let catalog = ArchiveCatalog::from_json(catalog_json, Mirror::Cddis).unwrap();
    let archive = FakeArchive::new();
    archive.publish("ftp://archive.test/nav/2023/166/brdc1660.23n.gz", "GPS NAV DATA\n");
    let tools = archive.tools();
    let dest = tempfile::tempdir().unwrap();
    let audit = MemoryAuditSink::default();

    let outcome = AcquisitionEngine::new(&catalog, &tools)
        .acquire(&nav_request(), dest.path(), &RunContext::new(&audit))
        .unwrap();

    assert_eq!(outcome.status, AcquisitionStatus::Succeeded);
    let matched = outcome.matched_candidate.as_ref().unwrap();
    assert_eq!(matched.naming_tag, NamingTag::Short);
    assert_eq!(
        outcome.remote_url_tried,
        vec![
            "ftp://archive.test/nav/2023/166/BRDC00IGS_R_20231660000_01D_GN.rnx.gz".to_string(),
            "ftp://archive.test/nav/2023/166/brdc1660.23n.gz".to_string(),
        ]
    );
    let local = outcome.local_path.unwrap();
    assert_eq!(local, dest.path().join("brdc1660.23n"));
    assert_eq!(fs::read_to_string(local).unwrap(), "GPS NAV DATA\n");
    assert_eq!(dir_listing(dest.path()), vec!["brdc1660.23n"]);
    assert!(audit.lines()[0].starts_with("INFO:"));
}

#[test]
fn test_existing_artifact_needs_no_tools() {
    let archive = FakeArchive::new();
    let tools = archive.tools();
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let dest = tempfile::tempdir().unwrap();
    fs::write(dest.path().join("brdc1660.23n"), "already here\n").unwrap();
    let audit = MemoryAuditSink::default();
    let ctx = RunContext::new(&audit);
    let engine = AcquisitionEngine::new(&catalog, &tools);

    for _ in 0..2 {
        let outcome = engine.acquire(&nav_request(), dest.path(), &ctx).unwrap();
        assert_eq!(outcome.status, AcquisitionStatus::AlreadyPresent);
        assert!(outcome.remote_url_tried.is_empty());
    }
    assert!(archive.calls().is_empty());
    assert_eq!(audit.lines().len(), 2);
}

#[test]
fn test_second_acquire_after_download_is_already_present() {
    let archive = FakeArchive::new();
    archive.publish(&format!("{CDDIS_NAV}/BRDC00IGS_R_20231660000_01D_GN.rnx.gz"), "NAV\n");
    let tools = archive.tools();
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let dest = tempfile::tempdir().unwrap();
    let audit = MemoryAuditSink::default();
    let ctx = RunContext::new(&audit);
    let engine = AcquisitionEngine::new(&catalog, &tools);

    let first = engine.acquire(&nav_request(), dest.path(), &ctx).unwrap();
    assert_eq!(first.status, AcquisitionStatus::Succeeded);
    assert_eq!(first.matched_candidate.unwrap().naming_tag, NamingTag::Long);
    assert_eq!(first.remote_url_tried.len(), 1);
    let calls_after_first = archive.calls().len();

    let second = engine.acquire(&nav_request(), dest.path(), &ctx).unwrap();
    assert_eq!(second.status, AcquisitionStatus::AlreadyPresent);
    assert_eq!(archive.calls().len(), calls_after_first);
    assert_eq!(dir_listing(dest.path()), vec!["brdc1660.23n"]);
}

#[test]
fn test_empty_local_file_is_not_present() {
    let archive = FakeArchive::new();
    archive.publish(&format!("{CDDIS_NAV}/brdc1660.23n.Z"), "NAV\n");
    let tools = archive.tools();
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let dest = tempfile::tempdir().unwrap();
    fs::write(dest.path().join("brdc1660.23n"), "").unwrap();
    let audit = MemoryAuditSink::default();

    let outcome = AcquisitionEngine::new(&catalog, &tools)
        .acquire(&nav_request(), dest.path(), &RunContext::new(&audit))
        .unwrap();
    assert_eq!(outcome.status, AcquisitionStatus::Succeeded);
    assert_eq!(outcome.remote_url_tried.len(), 4);
    assert_eq!(
        fs::read_to_string(dest.path().join("brdc1660.23n")).unwrap(),
        "NAV\n"
    );
}

#[test]
fn test_failed_decompression_leaves_no_intermediates() {
    let archive = FakeArchive::new();
    archive.publish(&format!("{CDDIS_NAV}/BRDC00IGS_R_20231660000_01D_GN.rnx.gz"), "NAV\n");
    let tools = archive.tools_with_broken_gzip();
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let dest = tempfile::tempdir().unwrap();
    let audit = MemoryAuditSink::default();

    let outcome = AcquisitionEngine::new(&catalog, &tools)
        .acquire(&nav_request(), dest.path(), &RunContext::new(&audit))
        .unwrap();

    assert_eq!(outcome.status, AcquisitionStatus::Failed);
    // the long candidate failed after its first suffix produced a file
    assert_eq!(outcome.remote_url_tried.len(), 3);
    assert!(dir_listing(dest.path()).is_empty());
}

#[test]
fn test_station_observation_is_converted() {
    let archive = FakeArchive::new();
    archive.publish(
        "ftps://gdc.cddis.eosdis.nasa.gov/gnss/data/daily/2023/166/23d/ALGO00CAN_R_20231660000_01D_30S_MO.crx.gz",
        "CRX\n",
    );
    let tools = archive.tools();
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let dest = tempfile::tempdir().unwrap();
    let audit = MemoryAuditSink::default();
    let request = ProductRequest::new(
        ProductKind::Observation,
        CalendarDate::ymd(2023, 6, 15).unwrap().to_epoch(),
        ProviderId::parse("mgex").unwrap(),
    )
    .with_station(StationCode::parse("algo").unwrap());

    let outcome = AcquisitionEngine::new(&catalog, &tools)
        .acquire(&request, dest.path(), &RunContext::new(&audit))
        .unwrap();

    assert_eq!(outcome.status, AcquisitionStatus::Succeeded);
    let local = outcome.local_path.unwrap();
    assert_eq!(local, dest.path().join("algo1660.23o"));
    assert_eq!(fs::read_to_string(local).unwrap(), "RINEX CRX\n");
    assert_eq!(dir_listing(dest.path()), vec!["algo1660.23o"]);
    assert!(archive
        .calls()
        .contains(&"crx2rnx:ALGO00CAN_R_20231660000_01D_30S_MO.crx".to_string()));
}

#[test]
fn test_unknown_provider_is_an_error() {
    let archive = FakeArchive::new();
    let tools = archive.tools();
    let catalog = ArchiveCatalog::embedded(Mirror::Cddis).unwrap();
    let dest = tempfile::tempdir().unwrap();
    let audit = MemoryAuditSink::default();
    let request = ProductRequest::new(
        ProductKind::Orbit,
        CalendarDate::ymd(2023, 6, 15).unwrap().to_epoch(),
        ProviderId::parse("hk").unwrap(),
    );

    let result = AcquisitionEngine::new(&catalog, &tools).acquire(&request, dest.path(), &RunContext::new(&audit));
    assert!(result.is_err());
    assert!(archive.calls().is_empty());
}
