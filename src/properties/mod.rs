//! `.properties` message files.
//!
//! - [`PropertyDocument`]: lossless parser/serializer with in-place edits
//! - [`load`] / [`save`]: disk access with file context on errors
//! - [`mutation_path`]: where the translation of a primary file lives

mod document;

pub use document::{Entry, Pair, PropertyDocument};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sync::atomic_write;

/// Load a properties file, or `None` if it does not exist.
///
/// # Errors
///
/// Returns an error (tagged with the path) if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Option<PropertyDocument>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path).map_err(|e| Error::in_file(path.display().to_string(), e.into()))?;
    PropertyDocument::parse(&text)
        .map(Some)
        .map_err(|e| Error::in_file(path.display().to_string(), e))
}

/// Write a document to disk atomically.
///
/// # Errors
///
/// Returns an error (tagged with the path) if the write fails.
pub fn save(path: &Path, doc: &PropertyDocument) -> Result<()> {
    atomic_write(path, &doc.serialize()).map_err(|e| Error::in_file(path.display().to_string(), e))
}

/// Path of the `mutation` translation of a primary file.
///
/// `i18n/messages.properties` + `de` → `i18n/messages_de.properties`.
#[must_use]
pub fn mutation_path(primary: &Path, mutation: &str) -> PathBuf {
    let stem = primary
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match primary.extension() {
        Some(ext) => format!("{stem}_{mutation}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{mutation}"),
    };
    primary.with_file_name(name)
}

/// Whether `path` names the translation of some primary file into one of `mutations`.
#[must_use]
pub fn is_mutation_file(path: &Path, mutations: &[String]) -> bool {
    let Some(stem) = path.file_stem().map(|s| s.to_string_lossy()) else {
        return false;
    };
    mutations
        .iter()
        .any(|m| stem.len() > m.len() + 1 && stem.ends_with(&format!("_{m}")))
}
