//! Error types and exit codes for docbase.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes used by the CLI.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const ALREADY_EXISTS: i32 = 3;
    pub const PATH_OUTSIDE_ROOT: i32 = 4;
    pub const MISSING_FRONT_MATTER: i32 = 5;
    pub const SCHEMA_VALIDATION_FAILED: i32 = 6;
    pub const UNSUPPORTED_OPERATION: i32 = 7;
    pub const CHECK_ISSUES_FOUND: i32 = 10;
}

/// Main error type for docbase operations.
///
/// Operations either apply all of their filesystem mutations or none of the
/// ones attempted before the failing step. The one exception is a directory
/// move (copy then delete): a failure during the delete phase leaves both
/// copies on disk.
#[derive(Error, Debug)]
pub enum DocError {
    #[error("Path escapes the workspace root: {0}")]
    PathOutsideRoot(PathBuf),

    #[error("Not found: {0}")]
    NotFound(PathBuf),

    #[error("Already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Document has no front matter: {0}")]
    MissingFrontMatter(PathBuf),

    #[error("Schema validation failed for '{field}': {message}")]
    SchemaValidationFailed { field: String, message: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid front matter: {0}")]
    InvalidFrontMatter(String),

    #[error("Workspace root not found at: {0}")]
    RootNotFound(PathBuf),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),
}

impl DocError {
    /// Returns the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DocError::NotFound(_) | DocError::RootNotFound(_) => exit_code::NOT_FOUND,
            DocError::AlreadyExists(_) => exit_code::ALREADY_EXISTS,
            DocError::PathOutsideRoot(_) => exit_code::PATH_OUTSIDE_ROOT,
            DocError::MissingFrontMatter(_) => exit_code::MISSING_FRONT_MATTER,
            DocError::SchemaValidationFailed { .. } => exit_code::SCHEMA_VALIDATION_FAILED,
            DocError::UnsupportedOperation(_) => exit_code::UNSUPPORTED_OPERATION,
            _ => exit_code::GENERAL_ERROR,
        }
    }

    pub(crate) fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        DocError::SchemaValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for docbase operations.
pub type Result<T> = std::result::Result<T, DocError>;

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    CheckIssuesFound,
}

impl ExitCode {
    /// Convert to exit code integer.
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Success => exit_code::SUCCESS,
            ExitCode::CheckIssuesFound => exit_code::CHECK_ISSUES_FOUND,
        }
    }
}
