//! Types for the reconciler module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::ReconcileError;

/// A file in the target tree with no counterpart among the valid outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionCandidate {
    pub path: PathBuf,
}

/// What an `apply` run did.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Files removed, in candidate order.
    pub deleted: Vec<PathBuf>,
    /// Empty directories removed, deepest first.
    pub pruned_directories: Vec<PathBuf>,
    /// Candidates refused because they lie inside the source tree.
    pub guard_trips: Vec<PathBuf>,
    /// Deletions that failed.
    pub failures: Vec<ReconcileError>,
}

impl ReconcileReport {
    /// Whether every candidate was handled without refusal or error.
    pub fn is_clean(&self) -> bool {
        self.guard_trips.is_empty() && self.failures.is_empty()
    }
}
