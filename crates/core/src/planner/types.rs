//! Types for the planner module.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::scanner::SourceEntry;

/// What to do when an output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPolicy {
    /// Leave existing outputs alone and count them as done.
    #[serde(default)]
    pub skip_if_present: bool,
    /// Re-convert over existing outputs when not skipping.
    #[serde(default = "default_true")]
    pub overwrite: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            skip_if_present: false,
            overwrite: true,
        }
    }
}

impl PlanPolicy {
    /// Policy used for incremental re-runs.
    pub fn skip_existing() -> Self {
        Self {
            skip_if_present: true,
            ..Self::default()
        }
    }
}

/// One file the executor must convert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedConversion {
    pub source: SourceEntry,
    pub target_path: PathBuf,
    /// Source extension, used to tally failures.
    pub extension: String,
}

/// Counters reported alongside the plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCounts {
    /// Convertible files whose output already existed.
    pub skipped_present: usize,
    /// Files on the skip list.
    pub skipped_non_audio: usize,
    /// Files with an unrecognised extension.
    pub skipped_unknown: usize,
    /// Existing outputs left in place because overwriting is disabled.
    pub refused_overwrite: usize,
    /// Files whose output path is the source file itself.
    pub skipped_same_path: usize,
}

/// The plan: what to convert, and which outputs are legitimate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscodePlan {
    pub conversions: Vec<PlannedConversion>,
    pub valid_outputs: HashSet<PathBuf>,
    pub counts: PlanCounts,
}

impl TranscodePlan {
    /// Whether there is nothing to convert.
    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }

    /// Number of planned conversions.
    pub fn len(&self) -> usize {
        self.conversions.len()
    }

    /// Whether `path` is a legitimate output of this plan.
    pub fn is_valid_output(&self, path: &Path) -> bool {
        self.valid_outputs.contains(path)
    }
}

/// Files already present in the target tree.
#[derive(Debug, Clone, Default)]
pub struct ExistingOutputs {
    files: HashSet<PathBuf>,
}

impl ExistingOutputs {
    /// Builds the set from known paths.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a file exists at `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the target tree held no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
