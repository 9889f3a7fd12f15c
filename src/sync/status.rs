//! Sync status display.
//!
//! Read-only view of the snapshot and of what the next export would upload.
//! The diff runs on a throwaway copy of the snapshot; nothing is written.

use std::collections::HashMap;

use colored::Colorize;

use crate::config::{Config, duplicate_patterns, resolve_paths};
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::sync::export::build_sheet;
use crate::sync::types::{SyncStatus, TrackedFile};

/// Compute the status of a project.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or a configured primary
/// file is missing or malformed.
pub fn get_sync_status(config: &Config) -> Result<SyncStatus> {
    let original = Snapshot::load(&config.snapshot)?;
    let mut scratch = original.clone();
    let files = resolve_paths(&config.root, &config.paths, &config.mutations)?;

    let mut pending = HashMap::new();
    let mut untracked = Vec::new();
    let mut untracked_rows = 0;
    for file in &files {
        let (sheet, _) = build_sheet(config, &original, &mut scratch, file)?;
        if original.contains(&file.key) {
            pending.insert(file.key.clone(), sheet.data_rows());
        } else {
            untracked_rows += sheet.data_rows();
            untracked.push(file.key.clone());
        }
    }

    let tracked = original
        .files()
        .map(|(path, record)| TrackedFile {
            path: path.to_string(),
            id: record.id,
            keys: record.len(),
            pending_rows: pending.get(path).copied(),
        })
        .collect();

    Ok(SyncStatus {
        snapshot: config.snapshot.display().to_string(),
        mutations: config.mutations.clone(),
        tracked,
        untracked,
        untracked_rows,
    })
}

/// Print sync status to stdout in a human-readable format.
pub fn print_status(status: &SyncStatus, config: &Config) {
    println!("{}", "Translation Status".bold().underline());
    println!();
    println!("  Snapshot:  {}", status.snapshot);
    println!("  Mutations: {}", status.mutations.join(", "));
    println!();

    if status.tracked.is_empty() {
        println!("{}", "No files tracked yet.".dimmed());
    } else {
        println!("{}", "Tracked Files:".blue().bold());
        for file in &status.tracked {
            let id = file.id.map_or_else(|| "-".to_string(), |id| id.to_string());
            let pending = match file.pending_rows {
                Some(0) => "up to date".green().to_string(),
                Some(rows) => format!("{rows} rows pending").yellow().to_string(),
                None => "no longer configured".dimmed().to_string(),
            };
            println!("  #{id:<4} {} ({} keys, {pending})", file.path, file.keys);
        }
    }

    if !status.untracked.is_empty() {
        println!();
        println!("{}", "Not Yet Exported:".yellow().bold());
        for path in &status.untracked {
            println!("  {path}");
        }
    }

    for pattern in duplicate_patterns(&config.paths) {
        println!("{} {pattern} is configured more than once", "warning:".yellow());
    }

    println!();
    let total = status.pending_rows();
    if total > 0 {
        println!("  {}: {total} rows", "Pending".bold());
        println!("{}", "Run 'propsync export <SPREADSHEET>' to upload them.".dimmed());
    } else {
        println!("{}", "Nothing to export.".green());
    }
}
