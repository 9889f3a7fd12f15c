//! Import pass.
//!
//! Reads every sheet of a spreadsheet back into the working snapshot, then
//! merges the translated values into the mutation files.
//!
//! Sheets are matched to message files through the id in their title, never
//! through the title's name part, so renaming a primary file between export
//! and import is harmless as long as the snapshot still knows the id.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::PropertyMap;
use crate::properties::mutation_path;
use crate::sheets::{SheetData, SheetService};
use crate::snapshot::Snapshot;
use crate::sync::reconcile::reconcile_file;
use crate::sync::rows::{decode_rows, parse_sheet_title};
use crate::sync::types::{ImportStats, MutationImportStats, ReconcileStats};
use crate::vcs::Stager;

/// Importer for one project.
pub struct Importer<'a, S: SheetService + ?Sized> {
    config: &'a Config,
    sheets: &'a S,
    stager: &'a dyn Stager,
    working: Snapshot,
}

impl<'a, S: SheetService + ?Sized> Importer<'a, S> {
    /// Create an importer, loading the configured snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot file exists but cannot be read.
    pub fn new(config: &'a Config, sheets: &'a S, stager: &'a dyn Stager) -> Result<Self> {
        let working = Snapshot::load(&config.snapshot)?;
        Ok(Self::with_snapshot(config, sheets, stager, working))
    }

    /// Create an importer over an already loaded snapshot.
    #[must_use]
    pub fn with_snapshot(config: &'a Config, sheets: &'a S, stager: &'a dyn Stager, snapshot: Snapshot) -> Self {
        Self {
            config,
            sheets,
            stager,
            working: snapshot,
        }
    }

    /// The working snapshot.
    #[must_use]
    pub fn working(&self) -> &Snapshot {
        &self.working
    }

    /// Import all sheets of `spreadsheet`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the spreadsheet has no sheets (`EmptySpreadsheet`)
    /// - a sheet title does not carry an id (`InvalidSheetTitle`)
    /// - a title id is not in the snapshot (`UnknownFileId`)
    /// - a primary file is gone or a file cannot be read, written or staged
    /// - the snapshot cannot be persisted
    pub fn import(&mut self, spreadsheet: &str) -> Result<ImportStats> {
        let sheets = self.sheets.read_sheets(spreadsheet)?;
        if sheets.is_empty() {
            return Err(Error::EmptySpreadsheet {
                id: spreadsheet.to_string(),
            });
        }

        let mut stats = ImportStats::default();
        for sheet in &sheets {
            self.read_sheet(sheet, &mut stats)?;
        }

        self.write_mutations(&mut stats)?;

        self.working.persist(&self.config.snapshot)?;
        info!(
            sheets = stats.sheets_read,
            updated = stats.total_updated(),
            "Import complete"
        );
        Ok(stats)
    }

    fn read_sheet(&mut self, sheet: &SheetData, stats: &mut ImportStats) -> Result<()> {
        let id = parse_sheet_title(&sheet.title)?;
        let record = self.working.lookup_by_id_mut(id)?;
        stats.sheets_read += 1;

        if sheet.rows.is_empty() {
            warn!(sheet = %sheet.title, "Sheet has no rows");
            return Ok(());
        }

        for row in decode_rows(&sheet.rows) {
            stats.rows_read += 1;
            if let Some(primary) = &row.primary {
                if record.put_property(&row.key, primary.as_str()).as_deref() != Some(primary.as_str()) {
                    stats.primary_updated += 1;
                }
            }
            for (mutation, value) in row.values {
                if !self.config.mutations.contains(&mutation) {
                    debug!(mutation = %mutation, "Ignoring column of unconfigured mutation");
                    continue;
                }
                record.put_mutation_value(&mutation, &row.key, value);
            }
        }
        debug!(sheet = %sheet.title, id, "Read sheet");
        Ok(())
    }

    fn write_mutations(&self, stats: &mut ImportStats) -> Result<()> {
        let root = &self.config.root;
        for (key, record) in self.working.files() {
            for mutation in &self.config.mutations {
                let Some(incoming) = record.mutation(mutation).filter(|m| !m.is_empty()) else {
                    continue;
                };
                let primary_path = root.join(key);
                let target = mutation_path(&primary_path, mutation);
                let reconcile = self.write_one(&primary_path, &target, incoming)?;
                stats.files.push(MutationImportStats {
                    path: mutation_path(Path::new(key), mutation)
                        .to_string_lossy()
                        .replace('\\', "/"),
                    mutation: mutation.clone(),
                    reconcile,
                });
            }
        }
        Ok(())
    }

    fn write_one(
        &self,
        primary: &Path,
        target: &Path,
        incoming: &PropertyMap,
    ) -> Result<ReconcileStats> {
        reconcile_file(primary, target, incoming, self.stager)
            .map_err(|e| Error::in_file(target.display().to_string(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::sheets::{MemorySheets, NewSheet};
    use crate::vcs::NoopStager;
    use std::fs;
    use tempfile::TempDir;

    fn config(root: &Path) -> Config {
        let file = ConfigFile {
            paths: vec!["messages.properties".to_string()],
            mutations: vec!["de".to_string()],
            ..ConfigFile::default()
        };
        Config::from_file(file, &root.join("propsync.json"), |_| None).unwrap()
    }

    fn rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter().map(|r| r.iter().map(ToString::to_string).collect()).collect()
    }

    fn sheet_service(title: &str, data: &[Vec<String>]) -> MemorySheets {
        let mut sheets = MemorySheets::new();
        sheets
            .create_sheet(
                "book",
                NewSheet {
                    title,
                    rows: data,
                    locked_editors: &[],
                    changed_cells: &[],
                },
            )
            .unwrap();
        sheets
    }

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new();
        let file = snapshot.get_or_create("messages.properties");
        file.put_property("greeting", "Hello");
        snapshot
    }

    #[test]
    fn test_import_writes_mutation_and_snapshot() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("messages.properties"), "greeting=Hello\nfarewell=Bye\n").unwrap();
        fs::write(dir.path().join("messages_de.properties"), "greeting=Hallo\n").unwrap();
        let config = config(dir.path());
        let sheets = sheet_service(
            "messages#1",
            &rows(&[&["key", "primary", "de"], &["farewell", "Bye", "Auf Wiedersehen"]]),
        );

        let stats = Importer::with_snapshot(&config, &sheets, &NoopStager, snapshot())
            .import("book")
            .unwrap();

        assert_eq!(stats.total_updated(), 1);
        assert_eq!(stats.primary_updated, 1);
        assert_eq!(stats.files[0].path, "messages_de.properties");
        assert_eq!(
            fs::read_to_string(dir.path().join("messages_de.properties")).unwrap(),
            "greeting=Hallo\nfarewell=Auf Wiedersehen\n"
        );
        let persisted = Snapshot::load(&config.snapshot).unwrap();
        assert_eq!(persisted.lookup_by_id(1).unwrap().value("farewell"), Some("Bye"));
    }

    #[test]
    fn test_empty_spreadsheet() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let sheets = MemorySheets::new();
        let err = Importer::with_snapshot(&config, &sheets, &NoopStager, snapshot())
            .import("book")
            .unwrap_err();
        assert!(matches!(err, Error::EmptySpreadsheet { .. }));
    }

    #[test]
    fn test_bad_title_and_unknown_id() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());

        let sheets = sheet_service("Sheet1", &[]);
        let err = Importer::with_snapshot(&config, &sheets, &NoopStager, snapshot())
            .import("book")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSheetTitle { .. }));

        let sheets = sheet_service("messages#9", &[]);
        let err = Importer::with_snapshot(&config, &sheets, &NoopStager, snapshot())
            .import("book")
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFileId { id: 9 }));
        assert!(!config.snapshot.exists());
    }

    #[test]
    fn test_sheet_without_translations_writes_nothing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("messages.properties"), "greeting=Hello\n").unwrap();
        let config = config(dir.path());
        let sheets = sheet_service("messages#1", &rows(&[&["key", "primary", "de"], &["greeting", "Hello", ""]]));

        let stats = Importer::with_snapshot(&config, &sheets, &NoopStager, snapshot())
            .import("book")
            .unwrap();

        assert!(stats.files.is_empty());
        assert!(!dir.path().join("messages_de.properties").exists());
    }
}
