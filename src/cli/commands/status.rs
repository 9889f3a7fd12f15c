//! Status command implementation.

use std::path::Path;

use crate::error::Result;
use crate::sync::{get_sync_status, print_status};

use super::load_config;

/// Execute the status command.
///
/// # Errors
///
/// Returns an error if configuration or snapshot loading fails, or a
/// configured primary file cannot be read.
pub fn execute(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let status = get_sync_status(&config)?;

    if json {
        println!("{}", serde_json::to_string(&status)?);
    } else {
        print_status(&status, &config);
    }
    Ok(())
}
