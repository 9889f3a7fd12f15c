//! Export diff.
//!
//! Decides, for every primary key and every configured mutation, whether a
//! translator needs to see the key. Per (key K, mutation M), first match wins:
//!
//! 1. M's file has no value for K → `MISSING`, blank cell
//! 2. K's primary value changed against the original baseline → `CHANGED`,
//!    blank cell (the stale translation is not shown)
//! 3. K is not in the original baseline → `NEW`, blank cell
//! 4. otherwise → `UNCHANGED`, cell shows M's value
//!
//! K's overall status is `UNCHANGED` when every mutation is `UNCHANGED`,
//! otherwise `NEW` for a new key and `CHANGED` for anything else. Only keys
//! whose overall status is not `UNCHANGED` become rows.
//!
//! The baseline always comes from the original snapshot. The working record
//! receives the current primary values and statuses for this run; whether
//! they become the next baseline is up to the caller.

use tracing::debug;

use crate::model::{MessageFile, PropertyStatus};
use crate::properties::PropertyDocument;
use crate::sync::rows::encode_row;
use crate::sync::types::DiffStats;

/// Rows and counters for one primary file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Data rows, without header.
    pub rows: Vec<Vec<String>>,
    pub stats: DiffStats,
}

/// Diff engine bound to the configured mutation order.
#[derive(Debug, Clone, Copy)]
pub struct DiffEngine<'a> {
    mutations: &'a [String],
}

impl<'a> DiffEngine<'a> {
    #[must_use]
    pub fn new(mutations: &'a [String]) -> Self {
        Self { mutations }
    }

    /// Diff one primary file.
    ///
    /// `baseline` is the original snapshot's record (`None` on first
    /// encounter). `mutation_docs` are in configured mutation order, an
    /// absent file given as an empty document. `working` is updated in place:
    /// pruned keys are removed, primary values and statuses stored, and each
    /// mutation's cell values and statuses recorded.
    pub fn diff(
        &self,
        baseline: Option<&MessageFile>,
        working: &mut MessageFile,
        primary: &PropertyDocument,
        mutation_docs: &[PropertyDocument],
    ) -> FileDiff {
        debug_assert_eq!(self.mutations.len(), mutation_docs.len());
        let mut out = FileDiff::default();

        out.stats.pruned = prune_deprecated(working, primary);

        for pair in primary.pairs() {
            let key = pair.key();
            let value = pair.value();
            out.stats.keys += 1;

            let primary_status = PropertyStatus::compare(baseline.and_then(|b| b.value(key)), value);
            working.put_property_with_status(key, value, primary_status);

            let mut cells = Vec::with_capacity(self.mutations.len());
            let mut all_unchanged = true;
            for (mutation, doc) in self.mutations.iter().zip(mutation_docs) {
                let (status, cell) = match doc.get(key) {
                    None => (PropertyStatus::Missing, String::new()),
                    Some(_) if primary_status == PropertyStatus::Changed => {
                        (PropertyStatus::Changed, String::new())
                    }
                    Some(_) if primary_status == PropertyStatus::New => (PropertyStatus::New, String::new()),
                    Some(translated) => (PropertyStatus::Unchanged, translated.to_string()),
                };
                debug!(key, mutation = %mutation, status = %status, "Diffed key");

                match status {
                    PropertyStatus::New => out.stats.new += 1,
                    PropertyStatus::Changed => out.stats.changed += 1,
                    PropertyStatus::Missing => out.stats.missing += 1,
                    PropertyStatus::Unchanged => {}
                }
                all_unchanged &= status == PropertyStatus::Unchanged;

                working.mutation_mut(mutation).put_with_status(key, cell.clone(), status);
                cells.push(cell);
            }

            let overall = roll_up(primary_status, all_unchanged);
            working.set_status(key, overall);
            if overall.needs_translation() {
                out.rows.push(encode_row(key, value, cells));
            }
        }

        out.stats.rows = out.rows.len();
        out
    }
}

/// Overall status of a primary key from its mutations.
fn roll_up(primary: PropertyStatus, all_unchanged: bool) -> PropertyStatus {
    if all_unchanged {
        PropertyStatus::Unchanged
    } else if primary == PropertyStatus::New {
        PropertyStatus::New
    } else {
        PropertyStatus::Changed
    }
}

/// Drop baseline keys the primary file no longer has. Returns how many.
fn prune_deprecated(working: &mut MessageFile, primary: &PropertyDocument) -> usize {
    let deprecated: Vec<String> = working
        .keys()
        .filter(|key| !primary.contains_key(key))
        .map(str::to_string)
        .collect();
    for key in &deprecated {
        debug!(key = %key, "Pruned deprecated key");
        working.remove_property(key);
    }
    deprecated.len()
}
