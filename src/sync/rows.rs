//! Sheet row codec.
//!
//! Sheets carry one primary file each. Layout:
//!
//! | key | primary | de | fr |
//! |-----|---------|----|----|
//! | farewell | Bye | | Au revoir |
//!
//! The title is `<basename>#<id>`, where `id` is the file's snapshot id.

use std::path::Path;

use tracing::warn;

use crate::error::{Error, Result};

/// Header of the key column.
pub const KEY_COLUMN: &str = "key";
/// Header of the primary value column.
pub const PRIMARY_COLUMN: &str = "primary";
/// Index of the first mutation column.
pub const FIRST_MUTATION_COLUMN: usize = 2;

/// Header row for the given mutations.
#[must_use]
pub fn header(mutations: &[String]) -> Vec<String> {
    let mut row = Vec::with_capacity(mutations.len() + FIRST_MUTATION_COLUMN);
    row.push(KEY_COLUMN.to_string());
    row.push(PRIMARY_COLUMN.to_string());
    row.extend(mutations.iter().cloned());
    row
}

/// Sheet title for a primary file.
///
/// `i18n/messages.properties` with id 3 → `messages#3`.
#[must_use]
pub fn sheet_title(path: &str, id: u32) -> String {
    let base = Path::new(path)
        .file_stem()
        .map_or_else(|| path.to_string(), |s| s.to_string_lossy().into_owned());
    format!("{base}#{id}")
}

/// Snapshot id encoded in a sheet title.
///
/// # Errors
///
/// Returns `InvalidSheetTitle` unless the title is exactly `<name>#<id>`.
pub fn parse_sheet_title(title: &str) -> Result<u32> {
    let invalid = || Error::InvalidSheetTitle {
        title: title.to_string(),
    };
    let mut parts = title.split('#');
    let (Some(_), Some(id), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    id.parse().map_err(|_| invalid())
}

/// Data row for one key.
#[must_use]
pub fn encode_row(key: &str, primary: &str, mutation_cells: Vec<String>) -> Vec<String> {
    let mut row = Vec::with_capacity(mutation_cells.len() + FIRST_MUTATION_COLUMN);
    row.push(key.to_string());
    row.push(primary.to_string());
    row.extend(mutation_cells);
    row
}

/// One decoded data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow {
    pub key: String,
    /// Primary value, `None` when the cell is blank.
    pub primary: Option<String>,
    /// `(mutation, value)` for every non-blank mutation cell.
    pub values: Vec<(String, String)>,
}

/// Decode the rows of a sheet.
///
/// Row 0 is the header. Rows whose cells are all blank are skipped, as are
/// rows with a blank key. Blank cells are not values. CRLF becomes LF.
#[must_use]
pub fn decode_rows(rows: &[Vec<String>]) -> Vec<DecodedRow> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    let mut decoded = Vec::new();
    for (index, row) in data.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let key = row.first().map(|k| k.trim()).unwrap_or_default();
        if key.is_empty() {
            warn!(row = index + 1, "Skipping row without key");
            continue;
        }

        let primary = row.get(1).and_then(|cell| cell_value(cell));
        let values = header
            .iter()
            .enumerate()
            .skip(FIRST_MUTATION_COLUMN)
            .filter(|(_, name)| !name.trim().is_empty())
            .filter_map(|(col, name)| {
                row.get(col)
                    .and_then(|cell| cell_value(cell))
                    .map(|value| (name.trim().to_string(), value))
            })
            .collect();

        decoded.push(DecodedRow {
            key: key.to_string(),
            primary,
            values,
        });
    }
    decoded
}

fn cell_value(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.replace("\r\n", "\n"))
    }
}
