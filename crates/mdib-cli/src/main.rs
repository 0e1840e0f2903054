#![doc = include_str!("../README.md")]

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            log,
            config,
            only,
            format,
            out,
        } => {
            commands::run::run_run_command(log, config, only, format, out)?;
        }
        Commands::List { format } => {
            commands::list::run_list_command(format)?;
        }
    }

    Ok(())
}
