//! Sync types for export/import.
//!
//! Statistics and intermediate results produced by the export, import and
//! status passes. Everything here serializes to JSON for `--json` output.

use serde::Serialize;

/// A sheet built by the export pass, ready for upload.
///
/// `rows[0]` is the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSheet {
    /// Sheet title, `<basename>#<id>`.
    pub title: String,
    /// Root-relative path of the primary file.
    pub path: String,
    /// Header row followed by one row per key that needs translation.
    pub rows: Vec<Vec<String>>,
    /// `(row, column)` cells filled by machine translation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub translated_cells: Vec<(usize, usize)>,
}

impl ExportSheet {
    /// Number of rows excluding the header.
    #[must_use]
    pub fn data_rows(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

/// Per-file counters from the diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    /// Primary keys processed.
    pub keys: usize,
    /// (key, mutation) pairs with status NEW.
    pub new: usize,
    /// (key, mutation) pairs with status CHANGED.
    pub changed: usize,
    /// (key, mutation) pairs with status MISSING.
    pub missing: usize,
    /// Baseline keys pruned because the primary file no longer has them.
    pub pruned: usize,
    /// Data rows produced.
    pub rows: usize,
}

impl DiffStats {
    /// Add another file's counters.
    pub fn absorb(&mut self, other: &Self) {
        self.keys += other.keys;
        self.new += other.new;
        self.changed += other.changed;
        self.missing += other.missing;
        self.pruned += other.pruned;
        self.rows += other.rows;
    }

    /// Whether nothing needs translation.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rows == 0
    }
}

/// Export result for one primary file.
#[derive(Debug, Clone, Serialize)]
pub struct FileExportStats {
    pub path: String,
    pub id: u32,
    pub title: String,
    #[serde(flatten)]
    pub diff: DiffStats,
}

/// Statistics from an export operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportStats {
    /// Per-file results in processing order.
    pub files: Vec<FileExportStats>,
    /// Sums over `files`.
    pub total: DiffStats,
    /// Sheets created in the spreadsheet.
    pub sheets_uploaded: usize,
    /// Sheets from the previous run that were deleted.
    pub sheets_deleted: usize,
    /// Files dropped from the snapshot because they are no longer configured.
    pub obsolete_files: Vec<String>,
    /// Cells filled by machine translation.
    pub translated_cells: usize,
    /// Nothing was uploaded, persisted or deleted.
    pub dry_run: bool,
    /// Sheets that would have been uploaded; kept on dry runs only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sheets: Vec<ExportSheet>,
}

impl ExportStats {
    /// Record one file's result.
    pub fn push_file(&mut self, file: FileExportStats) {
        self.total.absorb(&file.diff);
        self.files.push(file);
    }

    /// Whether no rows were exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total.rows == 0
    }
}

/// Result of reconciling one mutation file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Keys whose value changed from the incoming table.
    pub updated: usize,
    /// Keys kept only because the old mutation file had them.
    pub only_in_mutation: usize,
    /// Blank placeholder keys dropped.
    pub dropped: usize,
}

/// Import result for one mutation file.
#[derive(Debug, Clone, Serialize)]
pub struct MutationImportStats {
    /// Root-relative path of the mutation file.
    pub path: String,
    pub mutation: String,
    #[serde(flatten)]
    pub reconcile: ReconcileStats,
}

/// Statistics from an import operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportStats {
    pub sheets_read: usize,
    pub rows_read: usize,
    /// Primary values that differed from the baseline.
    pub primary_updated: usize,
    pub files: Vec<MutationImportStats>,
}

impl ImportStats {
    /// Total keys updated across all mutation files.
    #[must_use]
    pub fn total_updated(&self) -> usize {
        self.files.iter().map(|f| f.reconcile.updated).sum()
    }

    /// Total keys kept only in mutation files.
    #[must_use]
    pub fn total_only_in_mutation(&self) -> usize {
        self.files.iter().map(|f| f.reconcile.only_in_mutation).sum()
    }
}

/// A tracked file in the status report.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedFile {
    pub path: String,
    pub id: Option<u32>,
    /// Keys in the snapshot baseline.
    pub keys: usize,
    /// Rows the next export would produce, `None` if no longer configured.
    pub pending_rows: Option<usize>,
}

/// Read-only snapshot report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStatus {
    pub snapshot: String,
    pub mutations: Vec<String>,
    pub tracked: Vec<TrackedFile>,
    /// Configured primary files not yet in the snapshot.
    pub untracked: Vec<String>,
    /// Rows pending for untracked files.
    pub untracked_rows: usize,
}

impl SyncStatus {
    /// Total rows the next export would produce.
    #[must_use]
    pub fn pending_rows(&self) -> usize {
        self.tracked.iter().filter_map(|f| f.pending_rows).sum::<usize>() + self.untracked_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_stats_totals() {
        let mut stats = ExportStats::default();
        for rows in [2, 3] {
            stats.push_file(FileExportStats {
                path: "m.properties".into(),
                id: 1,
                title: "m#1".into(),
                diff: DiffStats { keys: 4, new: 1, rows, ..DiffStats::default() },
            });
        }
        assert_eq!(stats.total.rows, 5);
        assert_eq!(stats.total.keys, 8);
        assert!(!stats.is_empty());
    }

    #[test]
    fn test_data_rows_excludes_header() {
        let sheet = ExportSheet {
            title: "m#1".into(),
            path: "m.properties".into(),
            rows: vec![vec!["key".into(), "primary".into()]],
            translated_cells: Vec::new(),
        };
        assert_eq!(sheet.data_rows(), 0);
    }
}
