//! Error types for the scanner module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a scan.
///
/// Unreadable individual entries are logged and skipped instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The source root is missing or not a directory.
    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The target root is missing or not a directory.
    #[error("Target directory not found: {path}")]
    TargetNotFound { path: PathBuf },

    /// A mirrored directory could not be created.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
