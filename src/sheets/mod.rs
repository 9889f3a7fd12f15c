//! Spreadsheet backends.
//!
//! The sync passes only talk to a [`SheetService`]. Available backends:
//! - [`WorkbookSheets`]: a local JSON workbook file
//! - [`MemorySheets`]: in-memory, for tests

mod memory;
mod workbook;

pub use memory::{MemorySheet, MemorySheets};
pub use workbook::WorkbookSheets;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sheet listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    pub id: u32,
    pub title: String,
}

/// A sheet with its cell values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetData {
    pub id: u32,
    pub title: String,
    pub rows: Vec<Vec<String>>,
}

/// Everything needed to create a sheet.
#[derive(Debug, Clone, Copy)]
pub struct NewSheet<'a> {
    pub title: &'a str,
    /// Header row first.
    pub rows: &'a [Vec<String>],
    /// Accounts allowed to edit the protected key/primary columns.
    pub locked_editors: &'a [String],
    /// `(row, column)` cells filled by machine translation.
    pub changed_cells: &'a [(usize, usize)],
}

/// Spreadsheet operations used by export and import.
pub trait SheetService {
    /// Sheets of a spreadsheet, in order.
    ///
    /// # Errors
    ///
    /// Returns a `Sheets` error if the spreadsheet cannot be read.
    fn list_sheets(&self, spreadsheet: &str) -> Result<Vec<SheetInfo>>;

    /// Sheets of a spreadsheet with their rows.
    ///
    /// # Errors
    ///
    /// Returns a `Sheets` error if the spreadsheet cannot be read.
    fn read_sheets(&self, spreadsheet: &str) -> Result<Vec<SheetData>>;

    /// Delete sheets by id. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns a `Sheets` error if the spreadsheet cannot be written.
    fn delete_sheets(&mut self, spreadsheet: &str, ids: &[u32]) -> Result<()>;

    /// Create a sheet and return its id.
    ///
    /// # Errors
    ///
    /// Returns `SheetExists` if a sheet with the same title exists.
    fn create_sheet(&mut self, spreadsheet: &str, sheet: NewSheet<'_>) -> Result<u32>;
}
