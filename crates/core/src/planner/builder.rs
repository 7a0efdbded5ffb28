//! Plan construction from a scan and the current target tree.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::types::{ExistingOutputs, PlanPolicy, PlannedConversion, TranscodePlan};
use crate::scanner::{Classification, ScanResult};

impl ExistingOutputs {
    /// Walks `target_root` and records every file in it.
    ///
    /// Unreadable entries are logged and left out.
    pub fn collect(target_root: &Path) -> Self {
        let files = WalkDir::new(target_root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry in target tree");
                    None
                }
            })
            .filter(|entry| !entry.file_type().is_dir())
            .map(|entry| entry.into_path());

        let existing = Self::from_paths(files);
        debug!(
            target = %target_root.display(),
            files = existing.len(),
            "Collected existing target files"
        );
        existing
    }
}

/// Builds the transcoding plan.
///
/// Every convertible file contributes its target path to the valid outputs,
/// whether it ends up planned or not. Skipped and unknown files contribute
/// nothing, so stale outputs from earlier runs with other settings become
/// orphans.
pub fn build_plan(scan: &ScanResult, existing: &ExistingOutputs, policy: PlanPolicy) -> TranscodePlan {
    let mut plan = TranscodePlan::default();

    for file in &scan.files {
        match file.classification {
            Classification::ExplicitlySkipped => {
                plan.counts.skipped_non_audio += 1;
                continue;
            }
            Classification::Unknown => {
                plan.counts.skipped_unknown += 1;
                continue;
            }
            Classification::Convertible => {}
        }

        let Some(target) = &file.target_path else {
            continue;
        };
        plan.valid_outputs.insert(target.clone());

        // Converting in place would clobber the input, and cleanup would delete it
        if *target == file.entry.source_path {
            warn!(
                source = %target.display(),
                "Output path is the source file itself, not converting"
            );
            plan.counts.skipped_same_path += 1;
            continue;
        }

        if existing.contains(target) {
            if policy.skip_if_present {
                plan.counts.skipped_present += 1;
                continue;
            }
            if !policy.overwrite {
                warn!(
                    target = %target.display(),
                    "Output exists and overwriting is disabled, leaving it in place"
                );
                plan.counts.refused_overwrite += 1;
                continue;
            }
        }

        plan.conversions.push(PlannedConversion {
            source: file.entry.clone(),
            target_path: target.clone(),
            extension: file.entry.extension.clone(),
        });
    }

    info!(
        planned = plan.conversions.len(),
        valid_outputs = plan.valid_outputs.len(),
        skipped_present = plan.counts.skipped_present,
        skipped_non_audio = plan.counts.skipped_non_audio,
        skipped_unknown = plan.counts.skipped_unknown,
        refused_overwrite = plan.counts.refused_overwrite,
        skipped_same_path = plan.counts.skipped_same_path,
        "Transcode plan built"
    );

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{ScannedFile, SourceEntry};
    use std::path::PathBuf;

    fn scanned(rel: &str, ext: &str, classification: Classification, target: Option<&str>) -> ScannedFile {
        ScannedFile {
            entry: SourceEntry {
                source_path: PathBuf::from("/src").join(rel),
                relative_path: PathBuf::from(rel),
                extension: ext.to_string(),
                size_bytes: 10,
            },
            classification,
            target_path: target.map(PathBuf::from),
        }
    }

    fn sample_scan() -> ScanResult {
        ScanResult {
            source_root: PathBuf::from("/src"),
            target_root: PathBuf::from("/out"),
            files: vec![
                scanned("a/x.flac", "flac", Classification::Convertible, Some("/out/a/x.ogg")),
                scanned("a/y.jpg", "jpg", Classification::ExplicitlySkipped, None),
                scanned("b/z.mp3", "mp3", Classification::Convertible, Some("/out/b/z.ogg")),
                scanned("b/notes", "", Classification::Unknown, None),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_plan_from_empty_target() {
        let plan = build_plan(&sample_scan(), &ExistingOutputs::default(), PlanPolicy::default());

        let targets: Vec<_> = plan.conversions.iter().map(|c| c.target_path.clone()).collect();
        assert_eq!(
            targets,
            vec![PathBuf::from("/out/a/x.ogg"), PathBuf::from("/out/b/z.ogg")]
        );
        assert_eq!(plan.counts.skipped_non_audio, 1);
        assert_eq!(plan.counts.skipped_unknown, 1);
        assert_eq!(plan.counts.skipped_present, 0);
        assert_eq!(plan.valid_outputs.len(), 2);
        assert_eq!(plan.conversions[0].extension, "flac");
    }

    #[test]
    fn test_skip_if_present_keeps_output_valid() {
        let existing = ExistingOutputs::from_paths(["/out/a/x.ogg"]);
        let plan = build_plan(&sample_scan(), &existing, PlanPolicy::skip_existing());

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.conversions[0].target_path, PathBuf::from("/out/b/z.ogg"));
        assert_eq!(plan.counts.skipped_present, 1);
        assert!(plan.is_valid_output(Path::new("/out/a/x.ogg")));
    }

    #[test]
    fn test_overwrite_replans_existing() {
        let existing = ExistingOutputs::from_paths(["/out/a/x.ogg", "/out/b/z.ogg"]);
        let plan = build_plan(&sample_scan(), &existing, PlanPolicy::default());

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.counts.skipped_present, 0);
    }

    #[test]
    fn test_refused_overwrite() {
        let existing = ExistingOutputs::from_paths(["/out/a/x.ogg"]);
        let policy = PlanPolicy {
            skip_if_present: false,
            overwrite: false,
        };
        let plan = build_plan(&sample_scan(), &existing, policy);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.counts.refused_overwrite, 1);
        assert!(plan.is_valid_output(Path::new("/out/a/x.ogg")));
    }

    #[test]
    fn test_output_equal_to_source_is_never_planned() {
        let scan = ScanResult {
            source_root: PathBuf::from("/src"),
            target_root: PathBuf::from("/src"),
            files: vec![
                scanned("song.ogg", "ogg", Classification::Convertible, Some("/src/song.ogg")),
                scanned("other.flac", "flac", Classification::Convertible, Some("/src/other.ogg")),
            ],
            ..Default::default()
        };
        let existing = ExistingOutputs::from_paths(["/src/song.ogg", "/src/other.flac"]);

        let plan = build_plan(&scan, &existing, PlanPolicy::default());

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.conversions[0].target_path, PathBuf::from("/src/other.ogg"));
        assert_eq!(plan.counts.skipped_same_path, 1);
        // Still a legitimate file, so reconciliation leaves it alone
        assert!(plan.is_valid_output(Path::new("/src/song.ogg")));
    }

    #[test]
    fn test_skipped_files_are_not_valid_outputs() {
        let plan = build_plan(&sample_scan(), &ExistingOutputs::default(), PlanPolicy::default());
        assert!(!plan.is_valid_output(Path::new("/out/a/y.jpg")));
        assert!(!plan.is_valid_output(Path::new("/out/a/y.ogg")));
    }

    #[test]
    fn test_collect_existing_outputs() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("a")).unwrap();
        std::fs::write(temp.path().join("a/x.ogg"), b"x").unwrap();
        std::fs::write(temp.path().join("top.ogg"), b"x").unwrap();

        let existing = ExistingOutputs::collect(temp.path());
        assert_eq!(existing.len(), 2);
        assert!(existing.contains(&temp.path().join("a/x.ogg")));
        assert!(!existing.contains(&temp.path().join("a")));
    }
}
