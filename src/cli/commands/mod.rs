//! Command implementations.

pub mod completions;
pub mod export;
pub mod import;
pub mod status;
pub mod version;

use std::path::Path;

use crate::config::{Config, discover_config};
use crate::error::Result;

/// Discover and load the project configuration.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = discover_config(explicit)?;
    Config::load(&path)
}
