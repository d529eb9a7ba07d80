// src/error.rs

//! Crate-wide error type
//!
//! Every fallible operation in the install pipeline returns [`Result`].
//! All errors are fatal for the current operation: they roll back the
//! package being installed, release the lock, and surface to the user as
//! `mason: <message>`.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the package lifecycle engine
#[derive(Error, Debug)]
pub enum Error {
    /// Package name absent from every configured registry
    #[error("Package '{0}' not found")]
    NotFound(String),

    /// Package exists but is not installed (uninstall/upgrade)
    #[error("Package '{0}' is not installed")]
    NotInstalled(String),

    /// Recipe carries a deprecation message
    #[error("Package '{name}' is deprecated: {message}")]
    Deprecated { name: String, message: String },

    /// PURL type has no installer handler
    #[error("Installer for '{0}' is not implemented")]
    UnsupportedInstaller(String),

    /// No asset/download/build variant matches the current platform
    #[error("Package '{0}' does not support the current platform")]
    UnsupportedTarget(String),

    /// Non-2xx HTTP response or transport failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Corrupt or unrecognised archive
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// A registry file failed SHA-256 verification
    #[error("Checksum mismatch for '{file}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// An upstream tool exited non-zero
    #[error("Command '{command}' failed with {status}")]
    SubprocessFailed { command: String, status: String },

    /// An upstream tool required by the installer is not on PATH
    #[error("Required tool '{0}' not found on PATH")]
    ToolNotFound(String),

    /// A non-symlink already exists where a link would be placed
    #[error("Refusing to overwrite existing file at {0}")]
    LinkConflict(PathBuf),

    /// Registry archive references files that are missing or unreadable
    #[error("Registry is corrupt: {0}")]
    RegistryCorrupt(String),

    /// Archive entry or recipe path attempts to escape its root
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    /// Recipe template failed to expand
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Malformed recipe (missing fields, wrong shapes)
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        Error::TemplateError(err.to_string())
    }
}
