//! Primary file resolution.
//!
//! Turns the configured paths and glob patterns into the ordered list of
//! primary files. Mutation files picked up by a broad pattern are dropped.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::properties::is_mutation_file;

/// A resolved primary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryFile {
    /// Root-relative path with `/` separators; the snapshot key.
    pub key: String,
    /// Path on disk.
    pub path: PathBuf,
}

/// Patterns listed more than once, in first-seen order.
#[must_use]
pub fn duplicate_patterns(patterns: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    patterns
        .iter()
        .filter(|p| !seen.insert(p.as_str()) && reported.insert(p.as_str()))
        .map(String::as_str)
        .collect()
}

/// Expand `patterns` relative to `root`.
///
/// Results are de-duplicated keeping first-seen order. Files named like a
/// translation into one of `mutations` are skipped.
///
/// # Errors
///
/// Returns `PrimaryFileNotFound` for a plain path that does not exist, or a
/// `Config` error for an invalid pattern.
pub fn resolve_paths(root: &Path, patterns: &[String], mutations: &[String]) -> Result<Vec<PrimaryFile>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        let matches = if is_glob(pattern) {
            let full = format!(
                "{}/{}",
                glob::Pattern::escape(&root.to_string_lossy()),
                pattern
            );
            let mut found = Vec::new();
            for entry in glob::glob(&full)? {
                let path = entry.map_err(|e| Error::Io(e.into_error()))?;
                if path.is_file() {
                    found.push(path);
                }
            }
            if found.is_empty() {
                warn!(pattern = %pattern, "Pattern matched no files");
            }
            found
        } else {
            let path = root.join(pattern);
            if !path.is_file() {
                return Err(Error::PrimaryFileNotFound {
                    path: pattern.clone(),
                });
            }
            vec![path]
        };

        for path in matches {
            if is_mutation_file(&path, mutations) {
                debug!(path = %path.display(), "Skipping mutation file");
                continue;
            }
            let key = relative_key(root, &path);
            if seen.insert(key.clone()) {
                files.push(PrimaryFile { key, path });
            }
        }
    }

    Ok(files)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Root-relative key with `/` separators.
fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}
