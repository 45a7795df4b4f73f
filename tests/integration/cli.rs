//! End-to-end runs of the binary

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("gnss-data-downloader").unwrap();
    cmd.env_remove("GNSS_DATA_DIR").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_sources_list_json() {
    let output = bin()
        .args(["sources", "list", "orbit", "--output-format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["mirror"], "cddis");
    let entries = parsed["entries"].as_array().unwrap();
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| e["kind"] == "orbit"));
}

#[test]
fn test_resolve_navigation_urls() {
    let output = bin()
        .args([
            "resolve",
            "navigation",
            "--provider",
            "igs",
            "--date",
            "2023-06-15",
            "--output-format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["local_name"], "brdc1660.23n");
    let urls: Vec<&str> = parsed["urls"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap())
        .collect();
    assert_eq!(
        urls,
        vec![
            "ftps://gdc.cddis.eosdis.nasa.gov/gnss/data/daily/2023/166/23n/BRDC00IGS_R_20231660000_01D_GN.rnx.gz",
            "ftps://gdc.cddis.eosdis.nasa.gov/gnss/data/daily/2023/166/23n/BRDC00IGS_R_20231660000_01D_GN.rnx.Z",
            "ftps://gdc.cddis.eosdis.nasa.gov/gnss/data/daily/2023/166/23n/brdc1660.23n.gz",
            "ftps://gdc.cddis.eosdis.nasa.gov/gnss/data/daily/2023/166/23n/brdc1660.23n.Z",
        ]
    );
}

#[test]
fn test_resolve_day_of_year_date_and_human_output() {
    let output = bin()
        .args([
            "resolve", "orbit", "--provider", "cod", "--date", "2023-166", "--naming", "short",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("orbit cod -> cod22664.sp3"), "{stdout}");
    assert!(stdout.contains("/gnss/products/2266/cod22664.sp3.Z"), "{stdout}");
}

#[test]
fn test_resolve_unknown_provider_fails() {
    bin()
        .args(["resolve", "orbit", "--provider", "hk", "--date", "2023-06-15"])
        .assert()
        .failure();
}

#[test]
fn test_run_with_missing_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    bin()
        .args(["run", "--config"])
        .arg(temp_dir.path().join("missing.yaml"))
        .assert()
        .failure();
}

#[test]
fn test_run_without_wget_reports_failures() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("run.yaml");
    fs::write(
        &config,
        "main_dir: unused\ntime: { year: 2023, doy: 166 }\nproducts:\n  navigation: { from: igs }\ntools: { wget: /nonexistent/wget }\n",
    )
    .unwrap();
    let data_dir = temp_dir.path().join("data");

    let output = bin()
        .args(["run", "--output-format", "json", "--config"])
        .arg(&config)
        .arg("--data-dir")
        .arg(&data_dir)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["requested"], 1);
    assert_eq!(summary["failed"], 1);

    let audit = fs::read_to_string(data_dir.join("gnss_downloader.log")).unwrap();
    assert!(audit.contains("WARNING: navigation igs: brdc1660.23n not acquired"));
    assert!(data_dir.join("nav").is_dir());
}

#[test]
fn test_stitch_command() {
    let temp_dir = TempDir::new().unwrap();
    let paths: Vec<_> = ["a.sp3", "b.sp3", "c.sp3"]
        .iter()
        .map(|n| temp_dir.path().join(n))
        .collect();
    for (path, tag) in paths.iter().zip(["a", "b", "c"]) {
        fs::write(path, format!("#dP {tag}\n*  {tag}\nPG01 {tag}\nEOF\n")).unwrap();
    }

    let output = bin()
        .arg("stitch")
        .args(&paths)
        .args(["--output-format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["success"], true);

    assert_eq!(
        fs::read_to_string(&paths[1]).unwrap(),
        "#dP b\n*  a\nPG01 a\n*  b\nPG01 b\n*  c\nPG01 c\nEOF\n"
    );
}

#[test]
fn test_stitch_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    let current = temp_dir.path().join("b.sp3");
    fs::write(&current, "#dP b\nEOF\n").unwrap();

    bin()
        .arg("stitch")
        .arg(temp_dir.path().join("a.sp3"))
        .arg(&current)
        .arg(temp_dir.path().join("c.sp3"))
        .assert()
        .failure();
}

#[test]
fn test_stitch_empty_data_marker_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let paths: Vec<_> = ["a.sp3", "b.sp3", "c.sp3"]
        .iter()
        .map(|n| temp_dir.path().join(n))
        .collect();
    for path in &paths {
        fs::write(path, "#dP\n*  x\nEOF\n").unwrap();
    }

    let output = bin().arg("stitch").args(&paths).arg("--data-marker=").output().unwrap();
    assert!(!output.status.success());
    // nothing was touched
    assert_eq!(fs::read_to_string(&paths[1]).unwrap(), "#dP\n*  x\nEOF\n");
    assert!(!temp_dir.path().join("b.sp3.orig").exists());
}
