//! Types for the executor module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::converter::{AudioFormat, ConverterError};

/// Output settings applied to every conversion of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    pub format: AudioFormat,
    /// Target bitrate in kbps; `None` leaves the encoder default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<u32>,
}

impl OutputSettings {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            bitrate_kbps: None,
        }
    }

    pub fn with_bitrate(mut self, bitrate_kbps: Option<u32>) -> Self {
        self.bitrate_kbps = bitrate_kbps;
        self
    }
}

/// Broad cause of a failed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The encoder rejected the input or timed out.
    Transcode,
    /// Reading the input or writing the output failed.
    Io,
    /// Anything else, such as a missing binary or a crashed worker.
    Other,
}

impl From<&ConverterError> for FailureKind {
    fn from(error: &ConverterError) -> Self {
        if error.is_transcode_failure() {
            Self::Transcode
        } else if error.is_io() {
            Self::Io
        } else {
            Self::Other
        }
    }
}

/// A conversion that failed, attributable to its input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub extension: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Accumulated result of running a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Conversions that ran to success or failure.
    pub attempted: usize,
    /// Conversions that succeeded.
    pub succeeded: usize,
    /// Failure count per source extension.
    pub failed_by_extension: BTreeMap<String, usize>,
    /// Every failure with its reason, in plan order.
    pub failures: Vec<FileFailure>,
    /// In-flight conversions stopped by cancellation.
    pub interrupted: usize,
    /// Whether the batch stopped before working through the whole plan.
    pub cancelled: bool,
}

impl BatchOutcome {
    /// Total number of failed conversions.
    pub fn failed(&self) -> usize {
        self.failed_by_extension.values().sum()
    }

    /// Whether the whole plan was worked through.
    pub fn is_complete(&self) -> bool {
        !self.cancelled
    }

    pub(crate) fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub(crate) fn record_failure(&mut self, failure: FileFailure) {
        self.attempted += 1;
        *self
            .failed_by_extension
            .entry(failure.extension.clone())
            .or_insert(0) += 1;
        self.failures.push(failure);
    }

    pub(crate) fn record_interrupted(&mut self) {
        self.interrupted += 1;
        self.cancelled = true;
    }

    /// Number of failures of the given kind.
    pub fn failures_of(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    /// Failure tally in the form `2x .wma, 1x .ape`.
    pub fn failure_summary(&self) -> String {
        self.failed_by_extension
            .iter()
            .map(|(ext, count)| format!("{}x .{}", count, ext))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Per-file progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEvent {
    /// A conversion was dispatched.
    Started {
        index: usize,
        total: usize,
        source: PathBuf,
    },
    /// A conversion finished.
    Succeeded {
        index: usize,
        total: usize,
        source: PathBuf,
        target: PathBuf,
        duration_ms: u64,
    },
    /// A conversion failed; the batch continues.
    Failed {
        index: usize,
        total: usize,
        source: PathBuf,
        reason: String,
    },
    /// A conversion was interrupted by cancellation.
    Cancelled {
        index: usize,
        total: usize,
        source: PathBuf,
    },
}
