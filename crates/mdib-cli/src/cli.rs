//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Replays a recorded SDC message log and evaluates BICEPS conformance requirements.\n\n\
    Typical use:\n  \
    1. mdib-check list\n  \
    2. mdib-check run recording.json --config mdib-check.toml\n\n\
    Every requirement ends in PASS, FAIL or NO-TEST-DATA.\n\
    The exit status is 1 when a requirement fails or the log is inconsistent.";

#[derive(Parser)]
#[command(name = "mdib-check")]
#[command(about = "BICEPS conformance checks over recorded SDC message logs")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Evaluate requirements against a recorded message log
    Run {
        /// Path to the JSON message log
        log: PathBuf,

        /// Engine configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Evaluate only these requirement ids (repeatable)
        #[arg(long = "only", value_name = "ID")]
        only: Vec<String>,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,

        /// Optional report output path (JSON)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List the requirement catalogue
    List {
        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },
}
