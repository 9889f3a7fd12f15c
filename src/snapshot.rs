//! Translation snapshot.
//!
//! The snapshot is the cross-run memory of every primary message file: its
//! path, its stable id, and the key/value baseline the last import confirmed.
//! It is stored as a JSON document:
//!
//! ```json
//! {
//!   "next_id": 2,
//!   "files": { "i18n/messages.properties": { "id": 1, "properties": { "greeting": "Hello" } } }
//! }
//! ```
//!
//! `next_id` is the id counter. It only moves forward, so an id freed by a
//! dropped file is never handed out again. A bare path → record map (no
//! counter) is still accepted on load. The id → record index is derived when
//! loading and is never written.
//!
//! A run holds two instances: the original, loaded once and only ever read
//! (the diff baseline), and a working clone that accumulates the run's
//! changes and is persisted once at the end of a successful pass.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::MessageFile;
use crate::sync::{read_json, write_json};

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSnapshot {
    Counted {
        next_id: u32,
        files: IndexMap<String, MessageFile>,
    },
    Bare(IndexMap<String, MessageFile>),
}

#[derive(Serialize)]
struct StoredSnapshotRef<'a> {
    next_id: u32,
    files: &'a IndexMap<String, MessageFile>,
}

/// Registry of known primary message files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    files: IndexMap<String, MessageFile>,
    by_id: HashMap<u32, String>,
    next_id: u32,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            files: IndexMap::new(),
            by_id: HashMap::new(),
            next_id: 1,
        }
    }
}

impl Snapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from its path → record map, rebuilding the id index.
    ///
    /// Records without an id are kept but cannot be looked up by id. When two
    /// records claim the same id the first keeps it and the later one loses
    /// it, so it is issued a fresh id the next time it is registered.
    #[must_use]
    pub fn from_files(mut files: IndexMap<String, MessageFile>) -> Self {
        let mut by_id: HashMap<u32, String> = HashMap::new();
        let mut max_id = 0;
        for (path, file) in &mut files {
            match file.id {
                Some(id) => {
                    max_id = max_id.max(id);
                    if let Some(owner) = by_id.get(&id) {
                        warn!(path = %path, owner = %owner, id, "Snapshot id already taken, record will get a new id");
                        file.id = None;
                    } else {
                        by_id.insert(id, path.clone());
                    }
                }
                None => warn!(path = %path, "Snapshot record has no id"),
            }
        }
        Self {
            files,
            by_id,
            next_id: max_id + 1,
        }
    }

    /// Load a snapshot file.
    ///
    /// An absent or zero-length file yields an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let stored: Option<StoredSnapshot> =
            read_json(path).map_err(|e| Error::in_file(path.display().to_string(), e))?;
        let snapshot = match stored {
            Some(StoredSnapshot::Counted { next_id, files }) => {
                let mut snapshot = Self::from_files(files);
                snapshot.next_id = snapshot.next_id.max(next_id);
                snapshot
            }
            Some(StoredSnapshot::Bare(files)) => Self::from_files(files),
            None => Self::default(),
        };
        debug!(path = %path.display(), files = snapshot.len(), next_id = snapshot.next_id, "Loaded snapshot");
        Ok(snapshot)
    }

    /// Write the id counter and the path → record map to `path`.
    ///
    /// Mutation values and statuses are not part of the stored form.
    ///
    /// # Errors
    ///
    /// Returns `EmptySnapshot` if no file is tracked, so a failed run cannot
    /// clobber a real snapshot with an empty one. Returns an I/O error if the
    /// write fails.
    pub fn persist(&self, path: &Path) -> Result<()> {
        if self.files.is_empty() {
            return Err(Error::EmptySnapshot {
                path: path.to_path_buf(),
            });
        }
        let stored = StoredSnapshotRef {
            next_id: self.next_id,
            files: &self.files,
        };
        write_json(path, &stored).map_err(|e| Error::in_file(path.display().to_string(), e))?;
        debug!(path = %path.display(), files = self.files.len(), "Persisted snapshot");
        Ok(())
    }

    /// Record for `path`, if tracked.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&MessageFile> {
        self.files.get(path)
    }

    /// Mutable record for `path`, if tracked.
    pub fn get_mut(&mut self, path: &str) -> Option<&mut MessageFile> {
        self.files.get_mut(path)
    }

    /// Whether `path` is tracked.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Record for `path`, registering it with a fresh id on first encounter.
    ///
    /// A tracked record that lost its id gets a fresh one as well.
    pub fn get_or_create(&mut self, path: &str) -> &mut MessageFile {
        let needs_id = self.files.get(path).is_none_or(|f| f.id.is_none());
        if needs_id {
            let id = self.mint_id();
            self.by_id.insert(id, path.to_string());
            self.files.entry(path.to_string()).or_default().id = Some(id);
            debug!(path, id, "Registered message file");
        }
        self.files.entry(path.to_string()).or_default()
    }

    /// Record with the given id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFileId` if no record has this id.
    pub fn lookup_by_id(&self, id: u32) -> Result<&MessageFile> {
        self.by_id
            .get(&id)
            .and_then(|path| self.files.get(path))
            .ok_or(Error::UnknownFileId { id })
    }

    /// Mutable record with the given id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFileId` if no record has this id.
    pub fn lookup_by_id_mut(&mut self, id: u32) -> Result<&mut MessageFile> {
        self.by_id
            .get(&id)
            .and_then(|path| self.files.get_mut(path))
            .ok_or(Error::UnknownFileId { id })
    }

    /// Path of the record with the given id.
    #[must_use]
    pub fn path_of(&self, id: u32) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Drop the given paths from both indices. Returns how many were tracked.
    pub fn remove_paths<'a>(&mut self, paths: impl IntoIterator<Item = &'a str>) -> usize {
        let mut removed = 0;
        for path in paths {
            if let Some(file) = self.files.shift_remove(path) {
                if let Some(id) = file.id {
                    self.by_id.remove(&id);
                }
                debug!(path, "Dropped obsolete message file");
                removed += 1;
            }
        }
        removed
    }

    /// Copy of this registry carrying the baseline values of `baseline`.
    ///
    /// Tracked paths, ids and the id counter come from `self`. Each record
    /// keeps the values `baseline` holds for its path, limited to the keys
    /// `self` still has. A path `baseline` does not know starts empty.
    #[must_use]
    pub fn rebased_on(&self, baseline: &Snapshot) -> Self {
        let files = self
            .files
            .iter()
            .map(|(path, file)| (path.clone(), file.rebased_on(baseline.get(path))))
            .collect();
        Self {
            files,
            by_id: self.by_id.clone(),
            next_id: self.next_id,
        }
    }

    /// Tracked paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Tracked `(path, record)` pairs in order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &MessageFile)> {
        self.files.iter().map(|(p, f)| (p.as_str(), f))
    }

    /// Mutable `(path, record)` pairs in order.
    pub fn files_mut(&mut self) -> impl Iterator<Item = (&str, &mut MessageFile)> {
        self.files.iter_mut().map(|(p, f)| (p.as_str(), f))
    }

    /// Number of tracked files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn mint_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_absent_and_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        assert!(Snapshot::load(&path).unwrap().is_empty());

        fs::write(&path, "").unwrap();
        assert!(Snapshot::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_get_or_create_mints_sequential_ids() {
        let mut snapshot = Snapshot::new();
        assert_eq!(snapshot.get_or_create("a.properties").id, Some(1));
        assert_eq!(snapshot.get_or_create("b.properties").id, Some(2));
        assert_eq!(snapshot.get_or_create("a.properties").id, Some(1));
        assert_eq!(snapshot.path_of(2), Some("b.properties"));
    }

    #[test]
    fn test_ids_continue_after_max_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(
            &path,
            r#"{"a.properties": {"id": 4, "properties": {}}, "b.properties": {"id": 9, "properties": {"k": "v"}}}"#,
        )
        .unwrap();

        let mut snapshot = Snapshot::load(&path).unwrap();
        assert_eq!(snapshot.lookup_by_id(9).unwrap().value("k"), Some("v"));
        assert_eq!(snapshot.get_or_create("c.properties").id, Some(10));
    }

    #[test]
    fn test_record_without_id_is_not_indexed() {
        let mut files = IndexMap::new();
        files.insert("a.properties".to_string(), MessageFile::default());
        let mut snapshot = Snapshot::from_files(files);
        assert!(snapshot.lookup_by_id(1).is_err());

        let id = snapshot.get_or_create("a.properties").id;
        assert_eq!(id, Some(1));
        assert!(snapshot.lookup_by_id(1).is_ok());
    }

    #[test]
    fn test_lookup_unknown_id() {
        let snapshot = Snapshot::new();
        assert!(matches!(snapshot.lookup_by_id(3), Err(Error::UnknownFileId { id: 3 })));
    }

    #[test]
    fn test_remove_paths_drops_both_indices() {
        let mut snapshot = Snapshot::new();
        snapshot.get_or_create("a.properties");
        snapshot.get_or_create("b.properties");

        assert_eq!(snapshot.remove_paths(["a.properties", "zzz"]), 1);
        assert!(!snapshot.contains("a.properties"));
        assert!(snapshot.lookup_by_id(1).is_err());
        // ids are not reused
        assert_eq!(snapshot.get_or_create("c.properties").id, Some(3));
    }

    #[test]
    fn test_persist_empty_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        let err = Snapshot::new().persist(&path).unwrap_err();
        assert!(matches!(err, Error::EmptySnapshot { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");

        let mut snapshot = Snapshot::new();
        let file = snapshot.get_or_create("i18n/messages.properties");
        file.put_property("greeting", "Hello");
        file.put_mutation_value("de", "greeting", "Hallo");
        snapshot.persist(&path).unwrap();

        let stored: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            stored,
            serde_json::json!({
                "next_id": 2,
                "files": {"i18n/messages.properties": {"id": 1, "properties": {"greeting": "Hello"}}}
            })
        );

        let reloaded = Snapshot::load(&path).unwrap();
        let file = reloaded.lookup_by_id(1).unwrap();
        assert_eq!(file.value("greeting"), Some("Hello"));
        assert!(file.mutation("de").is_none());
    }

    #[test]
    fn test_dropped_max_id_is_not_reused_after_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");

        let mut snapshot = Snapshot::new();
        snapshot.get_or_create("a.properties");
        snapshot.get_or_create("b.properties");
        snapshot.remove_paths(["b.properties"]);
        snapshot.persist(&path).unwrap();

        let mut reloaded = Snapshot::load(&path).unwrap();
        assert_eq!(reloaded.get_or_create("c.properties").id, Some(3));
    }

    #[test]
    fn test_duplicate_id_goes_to_first_record() {
        let mut files = IndexMap::new();
        files.insert("a.properties".to_string(), MessageFile::with_id(1));
        files.insert("b.properties".to_string(), MessageFile::with_id(1));
        let mut snapshot = Snapshot::from_files(files);

        assert_eq!(snapshot.path_of(1), Some("a.properties"));
        assert_eq!(snapshot.get("b.properties").unwrap().id, None);
        assert_eq!(snapshot.get_or_create("b.properties").id, Some(2));
        assert_eq!(snapshot.path_of(2), Some("b.properties"));
    }

    #[test]
    fn test_rebased_keeps_ids_and_baseline_values() {
        let mut baseline = Snapshot::new();
        let file = baseline.get_or_create("a.properties");
        file.put_property("k", "Old");
        file.put_property("gone", "x");

        let mut working = baseline.clone();
        let file = working.get_or_create("a.properties");
        file.put_property("k", "New");
        file.put_property("added", "y");
        file.remove_property("gone");
        working.get_or_create("b.properties").put_property("z", "1");

        let rebased = working.rebased_on(&baseline);
        let a = rebased.lookup_by_id(1).unwrap();
        assert_eq!(a.properties().collect::<Vec<_>>(), vec![("k", "Old")]);
        assert!(rebased.lookup_by_id(2).unwrap().is_empty());
        assert_eq!(rebased.clone().get_or_create("c.properties").id, Some(3));
    }
}
