//! Import merge.
//!
//! Writes translated values into a mutation file using the primary file as a
//! template, so the mutation file mirrors the primary's comments, blank lines
//! and key order:
//!
//! 1. template = primary document with every value blanked (a key the
//!    primary repeats keeps only its effective occurrence)
//! 2. pairs of the existing mutation file are laid over the template with
//!    their original text; keys the primary does not have are orphans
//! 3. orphans are appended in their original order
//! 4. incoming values are applied where they differ
//! 5. keys still blank and not in the incoming table are dropped

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::PropertyMap;
use crate::properties::{self, Pair, PropertyDocument};
use crate::sync::types::ReconcileStats;
use crate::vcs::Stager;

/// Merge `incoming` into `existing` using `primary` as the template.
///
/// `existing` is the current mutation document, `None` if the file does not
/// exist yet.
///
/// # Errors
///
/// Returns `InvalidValue` if an incoming value cannot be written to a
/// properties file unchanged.
pub fn reconcile(
    primary: &PropertyDocument,
    existing: Option<&PropertyDocument>,
    incoming: &PropertyMap,
) -> Result<(PropertyDocument, ReconcileStats)> {
    let mut stats = ReconcileStats::default();
    let mut merged = primary.clone();
    let shadowed = merged.drop_shadowed();
    if shadowed > 0 {
        debug!(shadowed, "Dropped repeated primary keys from the template");
    }
    merged.blank_values();

    let mut orphans: Vec<Pair> = Vec::new();
    if let Some(existing) = existing {
        for pair in existing.pairs() {
            if merged.contains_key(pair.key()) {
                merged.put_pair(pair.clone());
            } else {
                warn!(key = pair.key(), "Key exists only in the mutation file");
                orphans.push(pair.clone());
            }
        }
    }
    stats.only_in_mutation = orphans.len();
    for orphan in orphans {
        merged.put_pair(orphan);
    }

    for (key, value) in incoming.iter() {
        if merged.get(key) != Some(value) {
            debug!(key, "Updated translation");
            merged.put(key, value)?;
            stats.updated += 1;
        }
    }

    let blank: Vec<String> = merged
        .pairs()
        .filter(|pair| pair.value().is_empty() && !incoming.contains_key(pair.key()))
        .map(|pair| pair.key().to_string())
        .collect();
    for key in &blank {
        merged.remove(key);
    }
    stats.dropped = blank.len();

    Ok((merged, stats))
}

/// Reconcile one mutation file on disk, then stage it.
///
/// # Errors
///
/// Returns `PrimaryFileNotFound` if the primary file is gone, or any error
/// from reading, writing or staging.
pub fn reconcile_file(
    primary_path: &Path,
    mutation_path: &Path,
    incoming: &PropertyMap,
    stager: &dyn Stager,
) -> Result<ReconcileStats> {
    let primary = properties::load(primary_path)?.ok_or_else(|| Error::PrimaryFileNotFound {
        path: primary_path.display().to_string(),
    })?;
    let existing = properties::load(mutation_path)?;

    let (merged, stats) = reconcile(&primary, existing.as_ref(), incoming)
        .map_err(|e| Error::in_file(mutation_path.display().to_string(), e))?;
    properties::save(mutation_path, &merged)?;
    stager.stage(mutation_path)?;

    info!(
        path = %mutation_path.display(),
        updated = stats.updated,
        only_in_mutation = stats.only_in_mutation,
        "Wrote mutation file"
    );
    Ok(stats)
}
