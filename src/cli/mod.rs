//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// propsync - keep .properties translations in sync with a translation spreadsheet
#[derive(Parser, Debug)]
#[command(name = "propsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: discovered propsync.json)
    #[arg(long, global = true, env = "PROPSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload keys that need translation, one sheet per primary file
    Export {
        /// Spreadsheet to export into (workbook file path)
        #[arg(env = "PROPSYNC_SPREADSHEET")]
        spreadsheet: String,

        /// Compute rows and statistics without uploading or writing anything
        #[arg(long)]
        dry_run: bool,

        /// Pre-fill blank cells with machine translations
        #[arg(long)]
        translate: bool,
    },

    /// Merge translated values from the spreadsheet into mutation files
    Import {
        /// Spreadsheet to import from (workbook file path)
        #[arg(env = "PROPSYNC_SPREADSHEET")]
        spreadsheet: String,

        /// Do not stage rewritten files in git
        #[arg(long)]
        no_stage: bool,
    },

    /// Show tracked files and pending export rows
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
