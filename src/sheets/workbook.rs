//! JSON workbook backend.
//!
//! The spreadsheet id is the path of a workbook file (relative paths resolve
//! against the workspace root). A missing file is an empty workbook. Layout:
//!
//! ```json
//! {
//!   "sheets": [
//!     {
//!       "id": 1,
//!       "title": "messages#3",
//!       "rows": [["key", "primary", "de"], ["farewell", "Bye", ""]],
//!       "locked_editors": ["lead@example.com"],
//!       "translated_cells": [[1, 2]]
//!     }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{NewSheet, SheetData, SheetInfo, SheetService};
use crate::error::{Error, Result};
use crate::sync::{read_json, write_json};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Workbook {
    #[serde(default)]
    sheets: Vec<StoredSheet>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSheet {
    id: u32,
    title: String,
    #[serde(default)]
    rows: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    locked_editors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    translated_cells: Vec<(usize, usize)>,
}

/// Workbook files on the local filesystem.
#[derive(Debug, Clone)]
pub struct WorkbookSheets {
    root: PathBuf,
}

impl WorkbookSheets {
    /// Backend resolving relative workbook paths against `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, spreadsheet: &str) -> PathBuf {
        let path = Path::new(spreadsheet);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn load(&self, spreadsheet: &str) -> Result<Workbook> {
        let path = self.path(spreadsheet);
        read_json(&path)
            .map(Option::unwrap_or_default)
            .map_err(|e| Error::Sheets(format!("cannot read workbook {}: {e}", path.display())))
    }

    fn store(&self, spreadsheet: &str, workbook: &Workbook) -> Result<()> {
        let path = self.path(spreadsheet);
        write_json(&path, workbook)
            .map_err(|e| Error::Sheets(format!("cannot write workbook {}: {e}", path.display())))
    }
}

impl SheetService for WorkbookSheets {
    fn list_sheets(&self, spreadsheet: &str) -> Result<Vec<SheetInfo>> {
        Ok(self
            .load(spreadsheet)?
            .sheets
            .into_iter()
            .map(|s| SheetInfo { id: s.id, title: s.title })
            .collect())
    }

    fn read_sheets(&self, spreadsheet: &str) -> Result<Vec<SheetData>> {
        Ok(self
            .load(spreadsheet)?
            .sheets
            .into_iter()
            .map(|s| SheetData {
                id: s.id,
                title: s.title,
                rows: s.rows,
            })
            .collect())
    }

    fn delete_sheets(&mut self, spreadsheet: &str, ids: &[u32]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut workbook = self.load(spreadsheet)?;
        let before = workbook.sheets.len();
        workbook.sheets.retain(|s| !ids.contains(&s.id));
        self.store(spreadsheet, &workbook)?;
        info!(spreadsheet, deleted = before - workbook.sheets.len(), "Deleted sheets");
        Ok(())
    }

    fn create_sheet(&mut self, spreadsheet: &str, sheet: NewSheet<'_>) -> Result<u32> {
        let mut workbook = self.load(spreadsheet)?;
        if workbook.sheets.iter().any(|s| s.title == sheet.title) {
            return Err(Error::SheetExists {
                title: sheet.title.to_string(),
            });
        }

        let id = workbook.sheets.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        workbook.sheets.push(StoredSheet {
            id,
            title: sheet.title.to_string(),
            rows: sheet.rows.to_vec(),
            locked_editors: sheet.locked_editors.to_vec(),
            translated_cells: sheet.changed_cells.to_vec(),
        });
        self.store(spreadsheet, &workbook)?;
        debug!(spreadsheet, title = sheet.title, id, "Created sheet");
        Ok(id)
    }
}
