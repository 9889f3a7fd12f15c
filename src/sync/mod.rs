//! Export and import of translations.
//!
//! - **Export**: primary files → diff against the snapshot → one sheet per file
//! - **Import**: sheets → snapshot → merged mutation files, staged in git
//! - **Status**: read-only view of what the next export would upload
//!
//! # Snapshot handling
//!
//! Each pass loads the snapshot once. The export keeps that copy as the
//! untouched diff baseline and applies its changes to a clone. Either pass
//! persists the snapshot only after everything else succeeded.
//!
//! # Example
//!
//! ```ignore
//! use propsync::sync::{Exporter, Importer};
//!
//! let stats = Exporter::new(&config, &mut sheets)?.export("book.json", false)?;
//! // ... translators fill the sheets ...
//! let stats = Importer::new(&config, &sheets, &stager)?.import("book.json")?;
//! ```

mod diff;
mod export;
mod file;
mod import;
mod reconcile;
pub mod rows;
mod status;
mod types;

pub use diff::{DiffEngine, FileDiff};
pub use export::Exporter;
pub use file::{atomic_write, read_json, write_json};
pub use import::Importer;
pub use reconcile::{reconcile, reconcile_file};
pub use status::{get_sync_status, print_status};
pub use types::{
    DiffStats, ExportSheet, ExportStats, FileExportStats, ImportStats, MutationImportStats, ReconcileStats,
    SyncStatus, TrackedFile,
};
