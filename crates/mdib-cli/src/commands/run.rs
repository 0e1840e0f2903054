// Command handler for: Run

use std::fs;
use std::path::PathBuf;

use miette::{miette, IntoDiagnostic};
use serde_json::{json, Value};
use tracing::info;

use mdib_conformance::catalogue;
use mdib_conformance::{Engine, EngineConfig, EngineReport, Requirement, Verdict};
use mdib_ir::InMemoryLog;

use super::helpers::{parse_output_format, sha256_hex_bytes, write_json_artifact};
use crate::OutputFormat;

pub(crate) const REPORT_SCHEMA_VERSION: u32 = 1;

pub(crate) fn run_run_command(
    log_path: PathBuf,
    config_path: Option<PathBuf>,
    only: Vec<String>,
    format: String,
    out: Option<PathBuf>,
) -> miette::Result<()> {
    let output_format = parse_output_format(&format);

    let bytes = fs::read(&log_path)
        .map_err(|e| miette!("cannot read message log {}: {e}", log_path.display()))?;
    let log_sha256 = sha256_hex_bytes(&bytes);
    let raw = String::from_utf8(bytes)
        .map_err(|e| miette!("message log {} is not UTF-8: {e}", log_path.display()))?;
    let log = InMemoryLog::from_json(&raw)
        .map_err(|e| miette!("cannot load message log {}: {e}", log_path.display()))?;
    info!(
        messages = log.messages.len(),
        manipulations = log.manipulations.len(),
        "loaded message log"
    );

    let config = match &config_path {
        Some(path) => EngineConfig::load(path).into_diagnostic()?,
        None => EngineConfig::default(),
    };

    let engine = if only.is_empty() {
        Engine::new(config)
    } else {
        Engine::with_requirements(config, select_requirements(&only)?)
    };
    info!(requirements = engine.requirement_ids().len(), "evaluating");

    let report = engine.run(&log).into_diagnostic()?;
    let document = report_json(&report, &log_path, &log_sha256);

    if let Some(path) = &out {
        write_json_artifact(path, &document)?;
        info!(path = %path.display(), "wrote report");
    }

    match output_format {
        OutputFormat::Text => print!("{}", render_report_text(&report)),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&document).into_diagnostic()?)
        }
    }

    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}

/// Resolves `--only` ids in catalogue order, ignoring repeats.
fn select_requirements(only: &[String]) -> miette::Result<Vec<Box<dyn Requirement>>> {
    if let Some(unknown) = only.iter().find(|id| !catalogue::is_known(id)) {
        return Err(miette!(
            "unknown requirement id '{unknown}' (see `mdib-check list`)"
        ));
    }
    Ok(catalogue::catalogue()
        .into_iter()
        .filter(|requirement| only.iter().any(|id| id == requirement.id()))
        .collect())
}

pub(crate) fn report_json(report: &EngineReport, log_path: &std::path::Path, log_sha256: &str) -> Value {
    json!({
        "schema_version": REPORT_SCHEMA_VERSION,
        "log": log_path.display().to_string(),
        "log_sha256": log_sha256,
        "sessions": report.sessions,
        "summary": {
            "passed": report.passed(),
            "failed": report.failed(),
            "no_test_data": report.no_test_data(),
        },
        "requirements": report.requirements,
    })
}

pub(crate) fn render_report_text(report: &EngineReport) -> String {
    let width = report
        .requirements
        .iter()
        .map(|entry| entry.id.len())
        .max()
        .unwrap_or(0);
    let mut out = format!("Sessions: {}\n\n", report.sessions);
    for entry in &report.requirements {
        out.push_str(&format!(
            "{:<12} {:<width$}  {}\n",
            entry.verdict.as_str(),
            entry.id,
            entry.description
        ));
        match &entry.verdict {
            Verdict::Pass => {}
            Verdict::Fail(failure) => {
                out.push_str(&format!("             {}\n", failure.reason));
                if !failure.handles.is_empty() {
                    out.push_str(&format!(
                        "             handles: {}\n",
                        failure.handles.join(", ")
                    ));
                }
                if let (Some(sequence_id), Some(version)) =
                    (&failure.sequence_id, failure.mdib_version)
                {
                    out.push_str(&format!(
                        "             at: {sequence_id} mdib version {version}\n"
                    ));
                }
            }
            Verdict::NoTestData { reason } => {
                out.push_str(&format!("             {reason}\n"));
            }
        }
    }
    out.push_str(&format!(
        "\nSummary: {} passed, {} failed, {} without test data\n",
        report.passed(),
        report.failed(),
        report.no_test_data()
    ));
    out
}
