//! In-memory sheet backend.

use std::collections::HashMap;

use super::{NewSheet, SheetData, SheetInfo, SheetService};
use crate::error::{Error, Result};

/// A created sheet with everything it was created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySheet {
    pub data: SheetData,
    pub locked_editors: Vec<String>,
    pub changed_cells: Vec<(usize, usize)>,
}

/// Spreadsheets held in memory, keyed by spreadsheet id.
#[derive(Debug, Clone, Default)]
pub struct MemorySheets {
    spreadsheets: HashMap<String, Vec<MemorySheet>>,
}

impl MemorySheets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sheets of a spreadsheet.
    #[must_use]
    pub fn sheets(&self, spreadsheet: &str) -> &[MemorySheet] {
        self.spreadsheets.get(spreadsheet).map(Vec::as_slice).unwrap_or_default()
    }

    /// Mutable rows of the sheet titled `title`, for simulating translators.
    pub fn rows_mut(&mut self, spreadsheet: &str, title: &str) -> Option<&mut Vec<Vec<String>>> {
        self.spreadsheets
            .get_mut(spreadsheet)?
            .iter_mut()
            .find(|s| s.data.title == title)
            .map(|s| &mut s.data.rows)
    }
}

impl SheetService for MemorySheets {
    fn list_sheets(&self, spreadsheet: &str) -> Result<Vec<SheetInfo>> {
        Ok(self
            .sheets(spreadsheet)
            .iter()
            .map(|s| SheetInfo {
                id: s.data.id,
                title: s.data.title.clone(),
            })
            .collect())
    }

    fn read_sheets(&self, spreadsheet: &str) -> Result<Vec<SheetData>> {
        Ok(self.sheets(spreadsheet).iter().map(|s| s.data.clone()).collect())
    }

    fn delete_sheets(&mut self, spreadsheet: &str, ids: &[u32]) -> Result<()> {
        if let Some(sheets) = self.spreadsheets.get_mut(spreadsheet) {
            sheets.retain(|s| !ids.contains(&s.data.id));
        }
        Ok(())
    }

    fn create_sheet(&mut self, spreadsheet: &str, sheet: NewSheet<'_>) -> Result<u32> {
        let sheets = self.spreadsheets.entry(spreadsheet.to_string()).or_default();
        if sheets.iter().any(|s| s.data.title == sheet.title) {
            return Err(Error::SheetExists {
                title: sheet.title.to_string(),
            });
        }
        let id = sheets.iter().map(|s| s.data.id).max().unwrap_or(0) + 1;
        sheets.push(MemorySheet {
            data: SheetData {
                id,
                title: sheet.title.to_string(),
                rows: sheet.rows.to_vec(),
            },
            locked_editors: sheet.locked_editors.to_vec(),
            changed_cells: sheet.changed_cells.to_vec(),
        });
        Ok(id)
    }
}
