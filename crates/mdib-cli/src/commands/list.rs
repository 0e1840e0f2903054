// Command handler for: List

use miette::IntoDiagnostic;
use serde::Serialize;

use mdib_conformance::catalogue;
use mdib_conformance::Family;

use super::helpers::parse_output_format;
use crate::OutputFormat;

#[derive(Debug, Serialize)]
pub(crate) struct CatalogueEntry {
    pub(crate) id: &'static str,
    pub(crate) family: Family,
    pub(crate) description: &'static str,
}

pub(crate) fn catalogue_entries() -> Vec<CatalogueEntry> {
    catalogue::catalogue()
        .iter()
        .map(|requirement| CatalogueEntry {
            id: requirement.id(),
            family: requirement.family(),
            description: requirement.description(),
        })
        .collect()
}

pub(crate) fn render_list_text(entries: &[CatalogueEntry]) -> String {
    let width = entries.iter().map(|entry| entry.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    let mut family = None;
    for entry in entries {
        if family != Some(entry.family) {
            if family.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("{}\n", entry.family));
            family = Some(entry.family);
        }
        out.push_str(&format!("  {:<width$}  {}\n", entry.id, entry.description));
    }
    out
}

pub(crate) fn run_list_command(format: String) -> miette::Result<()> {
    let output_format = parse_output_format(&format);
    let entries = catalogue_entries();
    match output_format {
        OutputFormat::Text => print!("{}", render_list_text(&entries)),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries).into_diagnostic()?)
        }
    }
    Ok(())
}
