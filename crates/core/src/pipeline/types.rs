//! Types for the pipeline module.

use std::path::PathBuf;

use crate::converter::{AudioFormat, ConversionResult};
use crate::planner::TranscodePlan;
use crate::scanner::ScanResult;

/// A scanned and planned run, ready to execute and reconcile.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    /// Canonical source root.
    pub source_root: PathBuf,
    /// Canonical target root.
    pub target_root: PathBuf,
    pub format: AudioFormat,
    pub scan: ScanResult,
    pub plan: TranscodePlan,
}

impl PreparedRun {
    /// Number of conversions the plan holds.
    pub fn to_convert(&self) -> usize {
        self.plan.len()
    }

    /// Number of outputs left alone because they already existed.
    pub fn skipped_present(&self) -> usize {
        self.plan.counts.skipped_present
    }
}

/// Result of converting a single file.
#[derive(Debug, Clone)]
pub enum SingleFileOutcome {
    /// Output existed and skip-if-present was requested.
    AlreadyPresent { output_path: PathBuf },
    Converted(ConversionResult),
}
