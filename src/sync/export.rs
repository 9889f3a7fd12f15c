//! Export pass.
//!
//! Diffs every configured primary file against the snapshot and uploads one
//! sheet per file that has keys needing translation.
//!
//! # Order of operations
//!
//! 1. list the sheets that already exist
//! 2. diff each primary file (sequentially) and register it in the working
//!    snapshot, minting ids for new files
//! 3. drop files that are no longer configured
//! 4. optionally machine-translate blank cells
//! 5. upload sheets with at least one data row
//! 6. persist the snapshot registry: new ids and dropped files are kept,
//!    baseline values stay those of the original snapshot
//! 7. delete the sheets listed in step 1
//!
//! Baseline values only move on import, once the exported rows come back.
//! Until then a second export sees the same NEW and CHANGED keys again.
//!
//! Any error aborts before step 6, so the snapshot on disk is untouched and a
//! rerun recomputes everything from the files.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{Config, PrimaryFile, SheetPacing, duplicate_patterns, resolve_paths};
use crate::error::{Error, Result};
use crate::properties::{self, PropertyDocument, mutation_path};
use crate::sheets::{NewSheet, SheetService};
use crate::snapshot::Snapshot;
use crate::sync::diff::DiffEngine;
use crate::sync::rows::{header, sheet_title};
use crate::sync::types::{ExportSheet, ExportStats, FileExportStats};
use crate::translate::TranslatedCells;

/// Exporter for one project.
///
/// Holds the original snapshot (the diff baseline, never modified) and the
/// working copy the diff fills in. At the end of a successful run the working
/// registry is persisted on top of the original baseline values.
pub struct Exporter<'a, S: SheetService + ?Sized> {
    config: &'a Config,
    sheets: &'a mut S,
    original: Snapshot,
    working: Snapshot,
}

impl<'a, S: SheetService + ?Sized> Exporter<'a, S> {
    /// Create an exporter, loading the configured snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot file exists but cannot be read.
    pub fn new(config: &'a Config, sheets: &'a mut S) -> Result<Self> {
        let original = Snapshot::load(&config.snapshot)?;
        Ok(Self::with_snapshot(config, sheets, original))
    }

    /// Create an exporter over an already loaded snapshot.
    #[must_use]
    pub fn with_snapshot(config: &'a Config, sheets: &'a mut S, original: Snapshot) -> Self {
        let working = original.clone();
        Self {
            config,
            sheets,
            original,
            working,
        }
    }

    /// The working snapshot.
    #[must_use]
    pub fn working(&self) -> &Snapshot {
        &self.working
    }

    /// Run the export without machine translation.
    ///
    /// # Errors
    ///
    /// See [`Exporter::export_with`].
    pub fn export(&mut self, spreadsheet: &str, dry_run: bool) -> Result<ExportStats> {
        self.export_with(spreadsheet, dry_run, |_| Ok(TranslatedCells::new()))
    }

    /// Run the export, letting `fill` pre-fill blank cells before upload.
    ///
    /// With `dry_run` the sheets are built and returned in the statistics,
    /// but nothing is uploaded, persisted or deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a configured primary file is missing or malformed
    /// - the sheet service fails (including `SheetExists`)
    /// - `fill` fails
    /// - the snapshot cannot be written
    pub fn export_with<F>(&mut self, spreadsheet: &str, dry_run: bool, fill: F) -> Result<ExportStats>
    where
        F: FnOnce(&mut [ExportSheet]) -> Result<TranslatedCells>,
    {
        let config = self.config;
        let mut stats = ExportStats {
            dry_run,
            ..ExportStats::default()
        };

        for pattern in duplicate_patterns(&config.paths) {
            warn!(pattern, "Path is configured more than once");
        }

        let previous = if dry_run {
            Vec::new()
        } else {
            self.sheets.list_sheets(spreadsheet)?
        };

        let files = resolve_paths(&config.root, &config.paths, &config.mutations)?;
        let mut sheets = Vec::with_capacity(files.len());
        for file in &files {
            let (sheet, file_stats) = build_sheet(config, &self.original, &mut self.working, file)?;
            stats.push_file(file_stats);
            sheets.push(sheet);
        }

        stats.obsolete_files = drop_obsolete(&mut self.working, &files);

        let translated = fill(&mut sheets)?;
        for sheet in &mut sheets {
            if let Some(cells) = translated.get(&sheet.title) {
                sheet.translated_cells.clone_from(cells);
            }
        }
        stats.translated_cells = translated.values().map(Vec::len).sum();

        if dry_run {
            stats.sheets = sheets.into_iter().filter(|s| s.data_rows() > 0).collect();
            return Ok(stats);
        }

        stats.sheets_uploaded = self.upload(spreadsheet, &sheets)?;

        self.working.rebased_on(&self.original).persist(&config.snapshot)?;

        if stats.sheets_uploaded > 0 && !previous.is_empty() {
            let ids: Vec<u32> = previous.iter().map(|s| s.id).collect();
            self.sheets.delete_sheets(spreadsheet, &ids)?;
            stats.sheets_deleted = ids.len();
        }

        info!(
            files = stats.files.len(),
            rows = stats.total.rows,
            uploaded = stats.sheets_uploaded,
            "Export complete"
        );
        Ok(stats)
    }

    fn upload(&mut self, spreadsheet: &str, sheets: &[ExportSheet]) -> Result<usize> {
        let mut pacer = Pacer::new(self.config.sheet_pacing);
        let mut uploaded = 0;
        for sheet in sheets {
            if sheet.data_rows() == 0 {
                info!(path = %sheet.path, "No changed data, skipping sheet");
                continue;
            }
            pacer.before_upload(sheet.data_rows());
            info!(path = %sheet.path, sheet = %sheet.title, rows = sheet.data_rows(), "Uploading sheet");
            self.sheets.create_sheet(
                spreadsheet,
                NewSheet {
                    title: &sheet.title,
                    rows: &sheet.rows,
                    locked_editors: &self.config.locked_cell_editors,
                    changed_cells: &sheet.translated_cells,
                },
            )?;
            uploaded += 1;
        }
        Ok(uploaded)
    }
}

/// Diff one primary file into a sheet, registering it in `working`.
///
/// # Errors
///
/// Returns `PrimaryFileNotFound` if the primary file is gone, or a parse error
/// (tagged with the file) for a malformed file.
pub(crate) fn build_sheet(
    config: &Config,
    original: &Snapshot,
    working: &mut Snapshot,
    file: &PrimaryFile,
) -> Result<(ExportSheet, FileExportStats)> {
    let primary = properties::load(&file.path)?.ok_or_else(|| Error::PrimaryFileNotFound {
        path: file.key.clone(),
    })?;
    let mutation_docs = config
        .mutations
        .iter()
        .map(|m| properties::load(&mutation_path(&file.path, m)).map(Option::unwrap_or_default))
        .collect::<Result<Vec<PropertyDocument>>>()?;

    let record = working.get_or_create(&file.key);
    let id = record.id.unwrap_or_default();
    let diff = DiffEngine::new(&config.mutations).diff(original.get(&file.key), record, &primary, &mutation_docs);

    let title = sheet_title(&file.key, id);
    info!(path = %file.key, id, rows = diff.stats.rows, "Processed primary file");

    let mut rows = Vec::with_capacity(diff.rows.len() + 1);
    rows.push(header(&config.mutations));
    rows.extend(diff.rows);

    let stats = FileExportStats {
        path: file.key.clone(),
        id,
        title: title.clone(),
        diff: diff.stats,
    };
    let sheet = ExportSheet {
        title,
        path: file.key.clone(),
        rows,
        translated_cells: Vec::new(),
    };
    Ok((sheet, stats))
}

/// Remove snapshot records whose path is no longer configured.
fn drop_obsolete(working: &mut Snapshot, files: &[PrimaryFile]) -> Vec<String> {
    let current: HashSet<&str> = files.iter().map(|f| f.key.as_str()).collect();
    let obsolete: Vec<String> = working
        .paths()
        .filter(|p| !current.contains(p))
        .map(str::to_string)
        .collect();
    for path in &obsolete {
        info!(path = %path, "Dropping file that is no longer configured");
    }
    working.remove_paths(obsolete.iter().map(String::as_str));
    obsolete
}

/// Sleeps between uploads once enough rows have gone out.
struct Pacer {
    pacing: Option<SheetPacing>,
    rows: usize,
}

impl Pacer {
    fn new(pacing: Option<SheetPacing>) -> Self {
        Self { pacing, rows: 0 }
    }

    fn before_upload(&mut self, rows: usize) {
        let Some(pacing) = self.pacing else {
            return;
        };
        self.rows += rows;
        if self.rows > pacing.max_rows {
            info!(pause_secs = pacing.pause_secs, "Upload limit reached, pausing");
            std::thread::sleep(Duration::from_secs(pacing.pause_secs));
            self.rows = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::sheets::MemorySheets;
    use crate::sync::Importer;
    use crate::vcs::NoopStager;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config(root: &Path, paths: &[&str], mutations: &[&str]) -> Config {
        let file = ConfigFile {
            paths: paths.iter().map(ToString::to_string).collect(),
            mutations: mutations.iter().map(ToString::to_string).collect(),
            ..ConfigFile::default()
        };
        Config::from_file(file, &root.join("propsync.json"), |_| None).unwrap()
    }

    #[test]
    fn test_export_uploads_and_persists() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("messages.properties"), "greeting=Hello\nfarewell=Bye\n").unwrap();
        fs::write(dir.path().join("messages_de.properties"), "greeting=Hallo\n").unwrap();
        let config = config(dir.path(), &["messages.properties"], &["de"]);
        let mut sheets = MemorySheets::new();

        let stats = Exporter::new(&config, &mut sheets).unwrap().export("book", false).unwrap();

        assert_eq!(stats.sheets_uploaded, 1);
        assert_eq!(stats.total.rows, 2);
        let uploaded = &sheets.sheets("book")[0];
        assert_eq!(uploaded.data.title, "messages#1");
        assert_eq!(uploaded.data.rows[0], vec!["key", "primary", "de"]);

        let snapshot = Snapshot::load(&config.snapshot).unwrap();
        let record = snapshot.lookup_by_id(1).unwrap();
        assert_eq!(snapshot.path_of(1), Some("messages.properties"));
        assert_eq!(record.value("farewell"), None);
    }

    #[test]
    fn test_changed_key_is_exported_until_imported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.properties"), "k=New text\n").unwrap();
        fs::write(dir.path().join("a_de.properties"), "k=Alter Text\n").unwrap();
        let config = config(dir.path(), &["a.properties"], &["de"]);

        let mut original = Snapshot::new();
        original.get_or_create("a.properties").put_property("k", "Old text");
        original.persist(&config.snapshot).unwrap();

        let mut sheets = MemorySheets::new();
        let first = Exporter::new(&config, &mut sheets).unwrap().export("book", false).unwrap();
        let second = Exporter::new(&config, &mut sheets).unwrap().export("book2", false).unwrap();

        assert_eq!(first.total.changed, 1);
        assert_eq!(second.total.changed, 1);
        assert_eq!(sheets.sheets("book2")[0].data.rows[1], vec!["k", "New text", ""]);
        let persisted = Snapshot::load(&config.snapshot).unwrap();
        assert_eq!(persisted.lookup_by_id(1).unwrap().value("k"), Some("Old text"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("messages.properties"), "a=A\n").unwrap();
        let config = config(dir.path(), &["messages.properties"], &["de"]);
        let mut sheets = MemorySheets::new();

        let stats = Exporter::new(&config, &mut sheets).unwrap().export("book", true).unwrap();

        assert!(stats.dry_run);
        assert_eq!(stats.sheets.len(), 1);
        assert!(sheets.sheets("book").is_empty());
        assert!(!config.snapshot.exists());
    }

    #[test]
    fn test_missing_primary_aborts_without_persisting() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), &["messages.properties"], &["de"]);
        let mut sheets = MemorySheets::new();

        let err = Exporter::new(&config, &mut sheets).unwrap().export("book", false).unwrap_err();

        assert!(matches!(err, Error::PrimaryFileNotFound { .. }));
        assert!(!config.snapshot.exists());
    }

    #[test]
    fn test_obsolete_files_are_dropped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.properties"), "k=v\n").unwrap();
        let config = config(dir.path(), &["a.properties"], &["de"]);

        let mut original = Snapshot::new();
        original.get_or_create("old.properties").put_property("x", "y");
        let mut sheets = MemorySheets::new();
        let mut exporter = Exporter::with_snapshot(&config, &mut sheets, original);

        let stats = exporter.export("book", false).unwrap();

        assert_eq!(stats.obsolete_files, vec!["old.properties"]);
        assert!(!exporter.working().contains("old.properties"));
        assert_eq!(exporter.working().get("a.properties").unwrap().id, Some(2));
    }

    #[test]
    fn test_previous_sheets_are_replaced() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.properties"), "k=v\n").unwrap();
        let config = config(dir.path(), &["a.properties"], &["de"]);
        let mut sheets = MemorySheets::new();
        sheets
            .create_sheet(
                "book",
                NewSheet {
                    title: "Sheet1",
                    rows: &[],
                    locked_editors: &[],
                    changed_cells: &[],
                },
            )
            .unwrap();

        let stats = Exporter::new(&config, &mut sheets).unwrap().export("book", false).unwrap();

        assert_eq!(stats.sheets_deleted, 1);
        let titles: Vec<_> = sheets.sheets("book").iter().map(|s| s.data.title.as_str()).collect();
        assert_eq!(titles, vec!["a#1"]);
    }

    #[test]
    fn test_clean_files_upload_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.properties"), "k=v\n").unwrap();
        fs::write(dir.path().join("a_de.properties"), "k=w\n").unwrap();
        let config = config(dir.path(), &["a.properties"], &["de"]);

        let mut sheets = MemorySheets::new();
        Exporter::new(&config, &mut sheets).unwrap().export("first", false).unwrap();
        Importer::new(&config, &sheets, &NoopStager).unwrap().import("first").unwrap();
        let stats = Exporter::new(&config, &mut sheets).unwrap().export("second", false).unwrap();

        assert!(stats.is_empty());
        assert_eq!(stats.sheets_uploaded, 0);
        assert!(sheets.sheets("second").is_empty());
    }

    #[test]
    fn test_pacer_resets_after_pause() {
        let mut pacer = Pacer::new(Some(SheetPacing { max_rows: 2, pause_secs: 0 }));
        pacer.before_upload(2);
        assert_eq!(pacer.rows, 2);
        pacer.before_upload(1);
        assert_eq!(pacer.rows, 0);
    }
}
