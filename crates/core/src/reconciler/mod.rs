//! Reconciler module for removing stale outputs.
//!
//! Reconciliation is two-step: `find_orphans` produces a dry-run list that a
//! caller can show and confirm, and `apply` performs the deletions. Any path
//! inside the protected source tree is refused with a guard trip.

mod error;
mod reconcile;
mod types;

pub use error::ReconcileError;
pub use reconcile::Reconciler;
pub use types::{DeletionCandidate, ReconcileReport};
