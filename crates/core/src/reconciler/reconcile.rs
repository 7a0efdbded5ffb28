//! Orphan detection and removal in the target tree.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use super::error::ReconcileError;
use super::types::{DeletionCandidate, ReconcileReport};

/// Removes target files that no source file accounts for.
///
/// Nothing inside `protected_root` is ever deleted, even when the caller
/// hands over a candidate that points there.
#[derive(Debug, Clone)]
pub struct Reconciler {
    target_root: PathBuf,
    protected_root: PathBuf,
}

impl Reconciler {
    /// Creates a reconciler for `target_root` that guards `protected_root`.
    pub fn new(target_root: impl Into<PathBuf>, protected_root: impl Into<PathBuf>) -> Self {
        Self {
            target_root: target_root.into(),
            protected_root: protected_root.into(),
        }
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Lists every file under the target root that is not a valid output.
    ///
    /// Deletes nothing. Candidates come back in sorted walk order.
    pub fn find_orphans(&self, valid_outputs: &HashSet<PathBuf>) -> Vec<DeletionCandidate> {
        let candidates: Vec<DeletionCandidate> = WalkDir::new(&self.target_root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry in target tree");
                    None
                }
            })
            .filter(|entry| !entry.file_type().is_dir())
            .filter(|entry| !valid_outputs.contains(entry.path()))
            .map(|entry| DeletionCandidate {
                path: entry.into_path(),
            })
            .collect();

        info!(
            target = %self.target_root.display(),
            orphans = candidates.len(),
            "Orphan scan complete"
        );
        candidates
    }

    /// Whether `path` is the protected root or lies beneath it.
    pub fn is_protected(&self, path: &Path) -> bool {
        path.starts_with(&self.protected_root)
    }

    /// Deletes the candidates, then prunes empty directories bottom-up.
    ///
    /// Guard trips and failed deletions are recorded and the run continues.
    /// The target root itself is never removed.
    pub fn apply(&self, candidates: &[DeletionCandidate]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for candidate in candidates {
            match self.delete_file(&candidate.path) {
                Ok(()) => {
                    debug!(path = %candidate.path.display(), "Deleted orphan");
                    report.deleted.push(candidate.path.clone());
                }
                Err(e) => self.record(&mut report, e),
            }
        }

        self.prune_empty_directories(&mut report);

        info!(
            deleted = report.deleted.len(),
            pruned_directories = report.pruned_directories.len(),
            guard_trips = report.guard_trips.len(),
            failures = report.failures.len(),
            "Reconciliation finished"
        );
        report
    }

    fn guard(&self, path: &Path) -> Result<(), ReconcileError> {
        if self.is_protected(path) {
            return Err(ReconcileError::GuardTrip {
                path: path.to_path_buf(),
                protected_root: self.protected_root.clone(),
            });
        }
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<(), ReconcileError> {
        self.guard(path)?;
        fs::remove_file(path).map_err(|e| ReconcileError::DeleteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn record(&self, report: &mut ReconcileReport, err: ReconcileError) {
        if err.is_guard_trip() {
            error!(error = %err, "Deletion guard tripped");
            report.guard_trips.push(err.path().clone());
        } else {
            warn!(error = %err, "Deletion failed");
            report.failures.push(err);
        }
    }

    /// Single bottom-up pass; children are visited before their parents, so
    /// a directory emptied by pruning is itself pruned in the same pass.
    fn prune_empty_directories(&self, report: &mut ReconcileReport) {
        let directories: Vec<PathBuf> = WalkDir::new(&self.target_root)
            .follow_links(false)
            .contents_first(true)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| entry.into_path())
            .collect();

        for dir in directories {
            if !is_empty_dir(&dir) {
                continue;
            }
            if let Err(e) = self.guard(&dir) {
                self.record(report, e);
                continue;
            }
            match fs::remove_dir(&dir) {
                Ok(()) => {
                    debug!(path = %dir.display(), "Pruned empty directory");
                    report.pruned_directories.push(dir);
                }
                Err(e) => self.record(
                    report,
                    ReconcileError::DeleteFailed {
                        path: dir,
                        source: e,
                    },
                ),
            }
        }
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::tree;
    use tempfile::TempDir;

    #[test]
    fn test_find_orphans_lists_only_invalid_files() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        tree(target.path(), &["a/x.ogg", "orphan.ogg"]).unwrap();
        let valid: HashSet<PathBuf> = [target.path().join("a/x.ogg")].into_iter().collect();

        let orphans = Reconciler::new(target.path(), source.path()).find_orphans(&valid);

        assert_eq!(
            orphans,
            vec![DeletionCandidate {
                path: target.path().join("orphan.ogg")
            }]
        );
        assert!(target.path().join("orphan.ogg").exists());
    }

    #[test]
    fn test_apply_deletes_and_prunes_bottom_up() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        tree(target.path(), &["keep/x.ogg", "gone/deep/old.ogg", "gone/cover.jpg"]).unwrap();
        fs::create_dir_all(target.path().join("empty/nested")).unwrap();
        let valid: HashSet<PathBuf> = [target.path().join("keep/x.ogg")].into_iter().collect();

        let reconciler = Reconciler::new(target.path(), source.path());
        let orphans = reconciler.find_orphans(&valid);
        assert_eq!(orphans.len(), 2);

        let report = reconciler.apply(&orphans);

        assert!(report.is_clean());
        assert_eq!(report.deleted.len(), 2);
        assert!(target.path().join("keep/x.ogg").exists());
        assert!(!target.path().join("gone").exists());
        assert!(!target.path().join("empty").exists());
        assert!(target.path().exists());
        // Children come before parents
        let deep = report
            .pruned_directories
            .iter()
            .position(|p| p == &target.path().join("gone/deep"))
            .unwrap();
        let gone = report
            .pruned_directories
            .iter()
            .position(|p| p == &target.path().join("gone"))
            .unwrap();
        assert!(deep < gone);
    }

    #[test]
    fn test_guard_trip_never_deletes_source() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        tree(source.path(), &["precious.flac"]).unwrap();
        tree(target.path(), &["orphan.ogg"]).unwrap();

        let reconciler = Reconciler::new(target.path(), source.path());
        let candidates = vec![
            DeletionCandidate {
                path: source.path().join("precious.flac"),
            },
            DeletionCandidate {
                path: target.path().join("orphan.ogg"),
            },
        ];

        let report = reconciler.apply(&candidates);

        assert!(source.path().join("precious.flac").exists());
        assert_eq!(report.guard_trips, vec![source.path().join("precious.flac")]);
        assert_eq!(report.deleted, vec![target.path().join("orphan.ogg")]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_guard_covers_root_itself() {
        let reconciler = Reconciler::new("/out", "/music");
        assert!(reconciler.is_protected(Path::new("/music")));
        assert!(reconciler.is_protected(Path::new("/music/a/b.flac")));
        assert!(!reconciler.is_protected(Path::new("/music-ogg/a.ogg")));
    }

    #[test]
    fn test_missing_candidate_is_a_failure() {
        let source = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        let reconciler = Reconciler::new(target.path(), source.path());

        let report = reconciler.apply(&[DeletionCandidate {
            path: target.path().join("vanished.ogg"),
        }]);

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], ReconcileError::DeleteFailed { .. }));
        assert!(report.deleted.is_empty());
    }
}
