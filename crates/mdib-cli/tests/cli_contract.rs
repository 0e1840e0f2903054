use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use mdib_ir::fixtures::*;
use mdib_ir::{ComponentActivation, InMemoryLog, Message, ReportFamily};
use serde_json::Value;

const C_14: &str = "BICEPS.C-14";

fn metric_report(version: u64, activation: ComponentActivation) -> Message {
    let state = metric_state(MEASUREMENT_METRIC, activation)
        .with_state_version(1)
        .with_descriptor_version(0);
    state_report(20, SEQUENCE_ID, version, ReportFamily::Metric, vec![state])
}

fn write_log(dir: &Path, activation: ComponentActivation) -> PathBuf {
    let log = InMemoryLog::new(
        vec![
            standard_baseline(10, SEQUENCE_ID, 0),
            metric_report(1, activation),
        ],
        vec![],
    );
    let path = dir.join("recording.json");
    fs::write(&path, serde_json::to_string_pretty(&log).unwrap()).unwrap();
    path
}

fn mdib_check(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mdib-check"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("mdib-check should run")
}

#[test]
fn list_json_names_every_requirement() {
    let output = mdib_check(&["list", "--format", "json"]);
    assert!(output.status.success());
    let entries: Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 36);
    assert_eq!(entries[0]["id"], "BICEPS.R0033");
    assert_eq!(entries[0]["family"], "version-monotonicity");
}

#[test]
fn conforming_log_exits_zero_with_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), ComponentActivation::StandBy);
    let out = dir.path().join("artifacts/report.json");
    let output = mdib_check(&[
        "run",
        log.to_str().unwrap(),
        "--only",
        C_14,
        "--format",
        "json",
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
    let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(printed, written);
    assert_eq!(printed["sessions"], 1);
    assert_eq!(printed["summary"]["passed"], 1);
    assert_eq!(printed["requirements"][0]["id"], C_14);
    assert_eq!(printed["requirements"][0]["verdict"], "PASS");
    assert_eq!(printed["log_sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn failing_log_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), ComponentActivation::On);
    let output = mdib_check(&["run", log.to_str().unwrap(), "--only", C_14]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FAIL"));
    assert!(stdout.contains(MEASUREMENT_METRIC));
}

#[test]
fn disabled_requirement_is_not_evaluated() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), ComponentActivation::On);
    let config = dir.path().join("mdib-check.toml");
    fs::write(&config, "[enabled]\n\"BICEPS.C-14\" = false\n").unwrap();
    let output = mdib_check(&[
        "run",
        log.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--format",
        "json",
    ]);
    let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = printed["requirements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 35);
    assert!(!ids.contains(&C_14));
}

#[test]
fn unknown_requirement_id_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), ComponentActivation::StandBy);
    let output = mdib_check(&["run", log.to_str().unwrap(), "--only", "BICEPS.R9999"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("BICEPS.R9999"));
}

#[test]
fn malformed_log_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"schema_version\": 2, \"messages\": []}").unwrap();
    let output = mdib_check(&["run", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("schema_version"));
}
