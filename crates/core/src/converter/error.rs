//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Target format is not one the converter can produce.
    #[error("Unsupported target format: {format}")]
    UnsupportedFormat { format: String },

    /// The encoder process reported a failure.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Conversion was cancelled before the encoder finished.
    #[error("Conversion cancelled")]
    Cancelled,
}

impl ConverterError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Whether the conversion was interrupted by a cancellation request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the encoder itself reported the failure.
    pub fn is_transcode_failure(&self) -> bool {
        matches!(self, Self::ConversionFailed { .. } | Self::Timeout { .. })
    }

    /// Whether this is an I/O failure rather than an encoder failure.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Short, single-line reason suitable for per-file reporting.
    ///
    /// Uses the last line of captured encoder output when there is one.
    pub fn reason(&self) -> String {
        match self {
            Self::ConversionFailed {
                stderr: Some(stderr),
                ..
            } => stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string())
                .unwrap_or_else(|| self.to_string()),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_prefers_last_stderr_line() {
        let err = ConverterError::conversion_failed(
            "FFmpeg exited with code: Some(1)",
            Some("first line\nInvalid data found when processing input\n".to_string()),
        );
        assert_eq!(err.reason(), "Invalid data found when processing input");
    }

    #[test]
    fn test_reason_without_stderr() {
        let err = ConverterError::conversion_failed("boom", None);
        assert_eq!(err.reason(), "Conversion failed: boom");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_classification_helpers() {
        assert!(ConverterError::Cancelled.is_cancelled());
        let io = ConverterError::from(std::io::Error::other("disk full"));
        assert!(io.is_io());
        assert!(!io.is_cancelled());
        assert!(!io.is_transcode_failure());
        assert!(ConverterError::Timeout { timeout_secs: 5 }.is_transcode_failure());
    }
}
