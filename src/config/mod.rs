//! Configuration management.
//!
//! A project is configured by a `propsync.json` file. The directory holding
//! it is the workspace root: every configured path is relative to it, and
//! snapshot keys are root-relative paths.
//!
//! ```json
//! {
//!   "paths": ["src/main/resources/i18n/*.properties"],
//!   "mutations": ["de", "fr"],
//!   "snapshot": "translation-snapshot.json",
//!   "locked_cell_editors": ["lead@example.com"],
//!   "source_lang": "en",
//!   "translator": { "endpoint": "http://localhost:5000" },
//!   "sheet_pacing": { "max_rows": 500, "pause_secs": 60 }
//! }
//! ```
//!
//! Discovery order:
//! 1. `--config` flag or `PROPSYNC_CONFIG`
//! 2. `propsync.json` in the git root
//! 3. `propsync.json` in the current directory or any parent
//! 4. `~/.propsync/config.json`

pub mod paths;

pub use paths::{PrimaryFile, duplicate_patterns, resolve_paths};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Project configuration file name.
pub const CONFIG_FILE: &str = "propsync.json";
/// Snapshot file used when none is configured.
pub const DEFAULT_SNAPSHOT: &str = "translation-snapshot.json";
pub const DEFAULT_SOURCE_LANG: &str = "en";
pub const DEFAULT_TRANSLATOR_ENDPOINT: &str = "http://localhost:5000";
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Environment variable overriding the translator endpoint.
pub const TRANSLATOR_ENDPOINT_ENV: &str = "PROPSYNC_TRANSLATOR_ENDPOINT";
/// Environment variable overriding the translator API key.
pub const TRANSLATOR_KEY_ENV: &str = "PROPSYNC_TRANSLATOR_KEY";

/// `propsync.json` as written on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Primary files or glob patterns.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Mutation names in column order.
    #[serde(default)]
    pub mutations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locked_cell_editors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_with_git: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator: Option<TranslatorSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_pacing: Option<SheetPacing>,
}

/// Translator section of `propsync.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

/// Upload pacing: after more than `max_rows` uploaded rows, pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetPacing {
    pub max_rows: usize,
    pub pause_secs: u64,
}

/// Resolved translator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_retries: u32,
}

impl TranslatorConfig {
    /// Resolve settings. Priority: environment > config file > default.
    pub fn resolve(file: Option<&TranslatorSettings>, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());
        Self {
            endpoint: non_empty(TRANSLATOR_ENDPOINT_ENV)
                .or_else(|| file.and_then(|f| f.endpoint.clone()))
                .unwrap_or_else(|| DEFAULT_TRANSLATOR_ENDPOINT.to_string()),
            api_key: non_empty(TRANSLATOR_KEY_ENV).or_else(|| file.and_then(|f| f.api_key.clone())),
            max_retries: file
                .and_then(|f| f.max_retries)
                .unwrap_or(DEFAULT_MAX_RETRIES),
        }
    }
}

/// Validated, resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace root (directory of the config file).
    pub root: PathBuf,
    /// The config file itself.
    pub source: PathBuf,
    pub paths: Vec<String>,
    pub mutations: Vec<String>,
    /// Absolute snapshot path.
    pub snapshot: PathBuf,
    pub locked_cell_editors: Vec<String>,
    pub source_lang: String,
    pub stage_with_git: bool,
    pub translator: TranslatorConfig,
    pub sheet_pacing: Option<SheetPacing>,
}

impl Config {
    /// Load and validate a config file, reading overrides from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the file cannot be read, parsed or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))?;
        let config = Self::from_file(file, path, |name| std::env::var(name).ok())?;
        debug!(config = %path.display(), root = %config.root.display(), "Loaded configuration");
        Ok(config)
    }

    /// Build a configuration from parsed file contents.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if validation fails.
    pub fn from_file(file: ConfigFile, source: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        validate(&file)?;

        let root = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let snapshot = root.join(file.snapshot.as_deref().unwrap_or(DEFAULT_SNAPSHOT));

        Ok(Self {
            translator: TranslatorConfig::resolve(file.translator.as_ref(), env),
            source: source.to_path_buf(),
            snapshot,
            paths: file.paths,
            mutations: file.mutations,
            locked_cell_editors: file.locked_cell_editors,
            source_lang: file.source_lang.unwrap_or_else(|| DEFAULT_SOURCE_LANG.to_string()),
            stage_with_git: file.stage_with_git.unwrap_or(true),
            sheet_pacing: file.sheet_pacing,
            root,
        })
    }
}

fn validate(file: &ConfigFile) -> Result<()> {
    if file.paths.is_empty() {
        return Err(Error::Config("\"paths\" must list at least one file or pattern".into()));
    }
    if file.mutations.is_empty() {
        return Err(Error::Config("\"mutations\" must list at least one mutation".into()));
    }
    for (i, mutation) in file.mutations.iter().enumerate() {
        if mutation.trim().is_empty() {
            return Err(Error::Config("mutation names must not be empty".into()));
        }
        if mutation.contains(['/', '\\', '.', '#']) || mutation.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!("invalid mutation name \"{mutation}\"")));
        }
        if file.mutations[..i].contains(mutation) {
            return Err(Error::Config(format!("mutation \"{mutation}\" is listed twice")));
        }
    }
    if let Some(pacing) = file.sheet_pacing {
        if pacing.max_rows == 0 {
            return Err(Error::Config("\"sheet_pacing.max_rows\" must be positive".into()));
        }
    }
    Ok(())
}

/// Find the configuration file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if an explicit path does not exist or no
/// configuration is found anywhere.
pub fn discover_config(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(Error::ConfigNotFound)
        };
    }

    if let Some(root) = git_toplevel() {
        let candidate = root.join(CONFIG_FILE);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if let Some(found) = find_upwards(&cwd) {
            return Ok(found);
        }
    }

    global_config_path()
        .filter(|p| p.is_file())
        .ok_or(Error::ConfigNotFound)
}

/// Walk up from `start` looking for `propsync.json`.
#[must_use]
pub fn find_upwards(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// `~/.propsync/config.json`.
#[must_use]
pub fn global_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".propsync").join("config.json"))
}

/// Get the git repository root directory.
fn git_toplevel() -> Option<PathBuf> {
    std::process::Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| PathBuf::from(String::from_utf8_lossy(&o.stdout).trim().to_string()))
}
