//! Error types for propsync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=parse, 3=not_found, 5=invalid_state, etc.)
//! - Retryability flags for scripted reruns
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for propsync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Parse (exit 2)
    MalformedProperties,
    InvalidSheetTitle,

    // Not Found (exit 3)
    FileIdNotFound,
    PrimaryFileNotFound,
    ConfigNotFound,

    // Validation (exit 4)
    InvalidArgument,
    InvalidValue,

    // Invalid state (exit 5)
    EmptySnapshot,
    EmptySpreadsheet,
    SheetExists,

    // Collaborators (exit 6)
    SheetError,
    TranslationError,
    RateLimited,
    VcsError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::MalformedProperties => "MALFORMED_PROPERTIES",
            Self::InvalidSheetTitle => "INVALID_SHEET_TITLE",
            Self::FileIdNotFound => "FILE_ID_NOT_FOUND",
            Self::PrimaryFileNotFound => "PRIMARY_FILE_NOT_FOUND",
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidValue => "INVALID_VALUE",
            Self::EmptySnapshot => "EMPTY_SNAPSHOT",
            Self::EmptySpreadsheet => "EMPTY_SPREADSHEET",
            Self::SheetExists => "SHEET_EXISTS",
            Self::SheetError => "SHEET_ERROR",
            Self::TranslationError => "TRANSLATION_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::VcsError => "VCS_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::MalformedProperties | Self::InvalidSheetTitle => 2,
            Self::FileIdNotFound | Self::PrimaryFileNotFound | Self::ConfigNotFound => 3,
            Self::InvalidArgument | Self::InvalidValue => 4,
            Self::EmptySnapshot | Self::EmptySpreadsheet | Self::SheetExists => 5,
            Self::SheetError | Self::TranslationError | Self::RateLimited | Self::VcsError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether simply rerunning the command may succeed.
    ///
    /// True for transient collaborator failures. False for parse, state
    /// and configuration errors, which need the input fixed first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::SheetError | Self::TranslationError | Self::IoError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in propsync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed properties at line {line}: {message}")]
    MalformedProperties { line: usize, message: String },

    #[error("Cannot parse file id from sheet title \"{title}\" (expected <name>#<id>)")]
    InvalidSheetTitle { title: String },

    #[error("No message file with id {id} in the snapshot")]
    UnknownFileId { id: u32 },

    #[error("Primary message file not found: {path}")]
    PrimaryFileNotFound { path: String },

    #[error("No propsync.json found")]
    ConfigNotFound,

    #[error("Refusing to persist an empty snapshot to {}", path.display())]
    EmptySnapshot { path: PathBuf },

    #[error("Spreadsheet {id} contains no sheets")]
    EmptySpreadsheet { id: String },

    #[error("Sheet \"{title}\" already exists")]
    SheetExists { title: String },

    #[error("Sheet service error: {0}")]
    Sheets(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Translation provider rate limit hit (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("Version control error: {0}")]
    Vcs(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Value of \"{key}\" cannot be written: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{path}: {source}")]
    InFile {
        path: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

impl From<glob::PatternError> for Error {
    fn from(err: glob::PatternError) -> Self {
        Self::Config(format!("invalid path pattern: {err}"))
    }
}

impl Error {
    /// Attach the file the error happened in.
    ///
    /// Already-wrapped errors are returned unchanged so the innermost path wins.
    #[must_use]
    pub fn in_file(path: impl Into<String>, err: Self) -> Self {
        match err {
            Self::InFile { .. } => err,
            other => Self::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// The error without any file context.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::InFile { source, .. } => source.root(),
            other => other,
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MalformedProperties { .. } => ErrorCode::MalformedProperties,
            Self::InvalidSheetTitle { .. } => ErrorCode::InvalidSheetTitle,
            Self::UnknownFileId { .. } => ErrorCode::FileIdNotFound,
            Self::PrimaryFileNotFound { .. } => ErrorCode::PrimaryFileNotFound,
            Self::ConfigNotFound => ErrorCode::ConfigNotFound,
            Self::EmptySnapshot { .. } => ErrorCode::EmptySnapshot,
            Self::EmptySpreadsheet { .. } => ErrorCode::EmptySpreadsheet,
            Self::SheetExists { .. } => ErrorCode::SheetExists,
            Self::Sheets(_) => ErrorCode::SheetError,
            Self::Translation(_) => ErrorCode::TranslationError,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::Vcs(_) => ErrorCode::VcsError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::InvalidValue { .. } => ErrorCode::InvalidValue,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::InFile { source, .. } => source.error_code(),
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self.root() {
            Self::ConfigNotFound => Some(
                "Create a propsync.json in the project root or pass --config <path>".to_string(),
            ),

            Self::InvalidSheetTitle { .. } => Some(
                "Sheets are matched to message files by their title. \
                 Do not rename sheets created by `propsync export`."
                    .to_string(),
            ),

            Self::UnknownFileId { .. } => Some(
                "The spreadsheet was exported against a different snapshot. \
                 Check the `snapshot` path in propsync.json."
                    .to_string(),
            ),

            Self::EmptySnapshot { .. } => Some(
                "Nothing was tracked in this run. Run `propsync export` first.".to_string(),
            ),

            Self::EmptySpreadsheet { id } => Some(format!(
                "Spreadsheet {id} has no sheets. Did the export upload anything?"
            )),

            Self::SheetExists { title } => Some(format!(
                "Remove sheet \"{title}\" from the spreadsheet or export into an empty one."
            )),

            Self::RateLimited { retry_after_secs } => Some(format!(
                "Wait {retry_after_secs}s and rerun. Nothing was persisted."
            )),

            Self::MalformedProperties { .. } => Some(
                "A line ends with a continuation backslash but no line follows it.".to_string(),
            ),

            Self::InvalidValue { key, .. } => Some(format!(
                "Edit the \"{key}\" cell in the spreadsheet and rerun the import."
            )),

            _ => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
