//! Import command implementation.

use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::sheets::WorkbookSheets;
use crate::sync::Importer;
use crate::vcs::{GitStager, NoopStager, Stager};

use super::load_config;

/// Execute the import command.
///
/// # Errors
///
/// Returns an error if configuration loading or the import fails.
pub fn execute(config_path: Option<&Path>, spreadsheet: &str, no_stage: bool, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let sheets = WorkbookSheets::new(&config.root);

    let git = GitStager::new(&config.root);
    let stager: &dyn Stager = if no_stage || !config.stage_with_git { &NoopStager } else { &git };

    let stats = Importer::new(&config, &sheets, stager)?.import(spreadsheet)?;

    if json {
        let output = serde_json::json!({
            "success": true,
            "spreadsheet": spreadsheet,
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("Import complete from: {spreadsheet}");
    println!();
    if stats.files.is_empty() {
        println!("{}", "No translations found.".dimmed());
        return Ok(());
    }
    for file in &stats.files {
        print!("  {} {} updated", file.path.bold(), file.reconcile.updated);
        if file.reconcile.only_in_mutation > 0 {
            print!(", {} only in mutation", file.reconcile.only_in_mutation.to_string().yellow());
        }
        println!();
    }
    println!();
    println!("  {}: {} keys updated in {} files", "Total".bold(), stats.total_updated(), stats.files.len());
    Ok(())
}
