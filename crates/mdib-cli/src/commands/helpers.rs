// Shared helpers for the command handlers: argument parsing, artifact
// writing and hashing.

use std::fs;
use std::path::Path;

use miette::IntoDiagnostic;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::OutputFormat;

pub(crate) fn parse_output_format(raw: &str) -> OutputFormat {
    match raw {
        "text" => OutputFormat::Text,
        "json" => OutputFormat::Json,
        other => {
            eprintln!("Unknown output format: {other}. Use 'text' or 'json'.");
            std::process::exit(1);
        }
    }
}

pub(crate) fn write_json_artifact(path: &Path, value: &Value) -> miette::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(path, serde_json::to_string_pretty(value).into_diagnostic()?).into_diagnostic()?;
    Ok(())
}

pub(crate) fn sha256_hex_bytes(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
