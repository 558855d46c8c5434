use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use archquote_core::export::ExportFormat;
use archquote_core::intake::parse_date;
use archquote_core::pricing::{DeterministicPricingEngine, PricingEngine};
use archquote_core::proposal::{format_proposal, ProposalDocument};
use chrono::Local;
use serde::Serialize;

use super::{build_input, load_config, CommandResult, QuoteArgs, EXIT_INPUT, EXIT_IO};

#[derive(Debug, Serialize)]
struct WrittenProposal {
    path: String,
    warnings: Vec<String>,
}

pub fn run(args: QuoteArgs, date: Option<&str>, out: Option<&Path>) -> CommandResult {
    let config = match load_config("proposal") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let input = match build_input("proposal", args) {
        Ok(input) => input,
        Err(result) => return result,
    };
    let today = match date.map(parse_date).transpose() {
        Ok(date) => date.unwrap_or_else(|| Local::now().date_naive()),
        Err(error) => {
            return CommandResult::failure("proposal", "invalid_input", error.to_string(), EXIT_INPUT)
        }
    };

    let result = DeterministicPricingEngine::new(config.pricing).compute(&input);
    let document = format_proposal(&input, &result, today);

    let Some(out) = out else {
        return CommandResult::plain(document.to_text());
    };

    match write_document(&document, out) {
        Ok(path) => CommandResult::with_data(
            "proposal",
            format!("proposal written to {}", path.display()),
            &WrittenProposal {
                path: path.display().to_string(),
                warnings: result.warnings.iter().map(|warning| warning.message()).collect(),
            },
        ),
        Err(error) => CommandResult::failure("proposal", "io", format!("{error:#}"), EXIT_IO),
    }
}

/// Writes the plain-text proposal. A directory target receives the default file name.
fn write_document(document: &ProposalDocument, out: &Path) -> anyhow::Result<PathBuf> {
    let path = if out.is_dir() { out.join(ExportFormat::Text.file_name()) } else { out.to_path_buf() };

    fs::write(&path, document.to_text())
        .with_context(|| format!("failed to write proposal to `{}`", path.display()))?;
    Ok(path)
}
