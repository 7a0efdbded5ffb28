//! Error types for the reconciler module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors recorded while reconciling the target tree.
///
/// None of these stop reconciliation; they are collected in the report.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A deletion candidate lies inside the protected source tree.
    #[error("Refusing to delete {path}: it is inside the protected source tree {protected_root}")]
    GuardTrip {
        path: PathBuf,
        protected_root: PathBuf,
    },

    /// Removing a file or directory failed.
    #[error("Failed to delete {path}")]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReconcileError {
    /// Path the error is about.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::GuardTrip { path, .. } | Self::DeleteFailed { path, .. } => path,
        }
    }

    pub fn is_guard_trip(&self) -> bool {
        matches!(self, Self::GuardTrip { .. })
    }
}
