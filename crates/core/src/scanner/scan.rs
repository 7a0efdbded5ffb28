//! Source tree walker.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::error::ScanError;
use super::naming::{split_extension, target_relative_path};
use super::types::{
    Classification, MirroredDirectory, ScanOptions, ScanResult, ScannedFile, SourceEntry,
    TargetCollision,
};

/// Walks a source tree and mirrors its directories under a target root.
#[derive(Debug, Clone)]
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    /// Creates a scanner with the given options.
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Returns the scan options.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scans `source_root`, creating each mirrored directory under
    /// `target_root` before any of its files are classified.
    ///
    /// Entries are visited in file-name order so repeated scans report
    /// identically. Symlinked directories are not followed. When the target
    /// root lives inside the source root it is not descended into.
    pub fn scan(&self, source_root: &Path, target_root: &Path) -> Result<ScanResult, ScanError> {
        if !source_root.is_dir() {
            return Err(ScanError::SourceNotFound {
                path: source_root.to_path_buf(),
            });
        }
        if !target_root.is_dir() {
            return Err(ScanError::TargetNotFound {
                path: target_root.to_path_buf(),
            });
        }

        let mut result = ScanResult {
            source_root: source_root.to_path_buf(),
            target_root: target_root.to_path_buf(),
            ..Default::default()
        };
        let mut files: Vec<ScannedFile> = Vec::new();
        let mut winners: HashMap<PathBuf, usize> = HashMap::new();

        let walker = WalkDir::new(source_root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_nested_target(e, target_root));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry in source tree");
                    continue;
                }
            };

            let Ok(relative) = entry.path().strip_prefix(source_root) else {
                continue;
            };
            let relative = relative.to_path_buf();

            if entry.file_type().is_dir() {
                let target_dir = target_root.join(&relative);
                let created = ensure_directory(&target_dir)?;
                if created {
                    debug!(path = %target_dir.display(), "Created mirrored directory");
                }
                result.directories.push(MirroredDirectory {
                    relative_path: relative,
                    target_path: target_dir,
                    created,
                });
                continue;
            }

            // Symlinks to regular files count as files; anything else is ignored
            if !entry.file_type().is_file() && !entry.path().is_file() {
                debug!(path = %entry.path().display(), "Ignoring non-regular file");
                continue;
            }

            // Lossy text is only used to classify; paths keep their raw bytes
            let file_name = entry.file_name().to_string_lossy();
            let (_, extension) = split_extension(&file_name);
            let extension = extension.to_ascii_lowercase();
            let classification = self.options.classify(&extension);

            let target_path = (classification == Classification::Convertible).then(|| {
                target_root.join(target_relative_path(&relative, self.options.target_format))
            });

            let scanned = ScannedFile {
                entry: SourceEntry {
                    source_path: entry.path().to_path_buf(),
                    relative_path: relative,
                    extension,
                    size_bytes: entry.metadata().map(|m| m.len()).unwrap_or(0),
                },
                classification,
                target_path,
            };

            if let Some(target) = &scanned.target_path {
                if let Some(previous) = winners.insert(target.clone(), files.len()) {
                    let superseded = files[previous].entry.source_path.clone();
                    warn!(
                        target = %target.display(),
                        superseded = %superseded.display(),
                        winner = %scanned.entry.source_path.display(),
                        "Two source files map to the same target, keeping the later one"
                    );
                    result.collisions.push(TargetCollision {
                        target_path: target.clone(),
                        superseded,
                        winner: scanned.entry.source_path.clone(),
                    });
                }
            }

            files.push(scanned);
        }

        // Drop files that lost a target collision
        result.files = files
            .into_iter()
            .enumerate()
            .filter(|(idx, f)| match &f.target_path {
                Some(target) => winners.get(target) == Some(idx),
                None => true,
            })
            .map(|(_, f)| f)
            .collect();

        info!(
            source = %source_root.display(),
            files = result.files.len(),
            convertible = result.count(Classification::Convertible),
            skipped = result.count(Classification::ExplicitlySkipped),
            unknown = result.count(Classification::Unknown),
            directories = result.directories.len(),
            directories_created = result.directories_created(),
            "Source scan complete"
        );

        Ok(result)
    }
}

fn is_nested_target(entry: &DirEntry, target_root: &Path) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.path() == target_root
}

/// Creates `path` if needed; "already exists" is not an error.
fn ensure_directory(path: &Path) -> Result<bool, ScanError> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path).map_err(|e| ScanError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(true)
}
