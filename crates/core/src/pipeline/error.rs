//! Error types for the pipeline module.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::converter::ConverterError;
use crate::scanner::ScanError;

/// Errors that abort a pipeline phase.
///
/// Per-file conversion failures are not among them; those end up in the
/// batch outcome.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Target format is unknown or has no available encoder.
    #[error("{format} is not a valid target format")]
    InvalidFormat { format: String },

    /// No target format was given and none could be derived.
    #[error("Specify a target format when converting directories")]
    MissingFormat,

    /// Source path does not exist.
    #[error("Source does not exist: {path}")]
    SourceNotFound { path: PathBuf },

    /// Target directory does not exist.
    #[error("Target directory does not exist: {path}")]
    TargetNotFound { path: PathBuf },

    /// Source and target resolve to the same path.
    #[error("Source and target are the same path: {path}")]
    SameSourceAndTarget { path: PathBuf },

    /// Scanning the source tree failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A single-file conversion failed.
    #[error(transparent)]
    Conversion(#[from] ConverterError),

    /// A blocking filesystem task did not complete.
    #[error("Filesystem task failed: {0}")]
    TaskFailed(String),
}

impl PipelineError {
    /// Whether the error was raised before anything on disk was touched.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::InvalidFormat { .. }
                | Self::MissingFormat
                | Self::SourceNotFound { .. }
                | Self::TargetNotFound { .. }
                | Self::SameSourceAndTarget { .. }
        )
    }
}
