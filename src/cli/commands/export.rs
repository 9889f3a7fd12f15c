//! Export command implementation.

use std::path::Path;

use colored::Colorize;

use crate::error::{Error, Result};
use crate::sheets::WorkbookSheets;
use crate::sync::{ExportStats, Exporter};
use crate::translate::{LibreTranslateProvider, fill_blank_cells};

use super::load_config;

/// Execute the export command.
///
/// # Errors
///
/// Returns an error if configuration loading, the export itself, or machine
/// translation fails.
pub fn execute(config_path: Option<&Path>, spreadsheet: &str, dry_run: bool, translate: bool, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let mut sheets = WorkbookSheets::new(&config.root);
    let mut exporter = Exporter::new(&config, &mut sheets)?;

    let stats = if translate {
        let provider = LibreTranslateProvider::from_config(&config.translator);
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
        exporter.export_with(spreadsheet, dry_run, |sheets| {
            rt.block_on(fill_blank_cells(
                &provider,
                sheets,
                &config.source_lang,
                config.translator.max_retries,
            ))
        })?
    } else {
        exporter.export(spreadsheet, dry_run)?
    };

    if json {
        let output = serde_json::json!({
            "success": true,
            "spreadsheet": spreadsheet,
            "stats": stats,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_stats(spreadsheet, &stats);
    }
    Ok(())
}

fn print_stats(spreadsheet: &str, stats: &ExportStats) {
    if stats.dry_run {
        println!("{}", "Dry run: nothing uploaded or written.".yellow());
        println!();
    }

    for file in &stats.files {
        let rows = if file.diff.rows == 0 {
            "up to date".green().to_string()
        } else {
            format!("{} rows", file.diff.rows).cyan().to_string()
        };
        println!("  {} {} ({rows})", file.title.bold(), file.path);
    }
    if !stats.obsolete_files.is_empty() {
        println!();
        println!("{}", "No longer configured:".yellow().bold());
        for path in &stats.obsolete_files {
            println!("  {path}");
        }
    }

    println!();
    if stats.is_empty() {
        println!("Nothing to translate.");
        return;
    }
    println!("  New:      {}", stats.total.new);
    println!("  Changed:  {}", stats.total.changed);
    println!("  Missing:  {}", stats.total.missing);
    if stats.translated_cells > 0 {
        println!("  Machine-translated cells: {}", stats.translated_cells);
    }
    println!("  {}: {} rows", "Total".bold(), stats.total.rows);
    if !stats.dry_run {
        println!(
            "  Uploaded {} sheets to {spreadsheet}",
            stats.sheets_uploaded
        );
    }
}
