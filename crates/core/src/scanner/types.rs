//! Types for the scanner module.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::converter::AudioFormat;

/// How a source file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Eligible for conversion.
    Convertible,
    /// Extension is on the skip list.
    ExplicitlySkipped,
    /// Extension is not recognised as an input format.
    Unknown,
}

/// A file found in the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Absolute path of the file.
    pub source_path: PathBuf,
    /// Path relative to the source root.
    pub relative_path: PathBuf,
    /// Final extension token, lowercased, without the dot.
    pub extension: String,
    /// File size in bytes at scan time.
    pub size_bytes: u64,
}

/// A source file with its classification and, if convertible, its output path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedFile {
    pub entry: SourceEntry,
    pub classification: Classification,
    /// Output path under the target root; set only for convertible files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_path: Option<PathBuf>,
}

/// A directory of the source tree and its mirror under the target root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirroredDirectory {
    /// Path relative to the source root (empty for the root itself).
    pub relative_path: PathBuf,
    /// Mirrored directory under the target root.
    pub target_path: PathBuf,
    /// Whether the directory was created by this scan.
    pub created: bool,
}

/// Two source files that map to the same output path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCollision {
    pub target_path: PathBuf,
    /// Source that was scanned first and dropped.
    pub superseded: PathBuf,
    /// Source that was scanned last and kept.
    pub winner: PathBuf,
}

/// Everything a scan produced, in walk order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub source_root: PathBuf,
    pub target_root: PathBuf,
    pub files: Vec<ScannedFile>,
    pub directories: Vec<MirroredDirectory>,
    pub collisions: Vec<TargetCollision>,
}

impl ScanResult {
    /// Convertible files with their target paths.
    pub fn convertible(&self) -> impl Iterator<Item = (&SourceEntry, &PathBuf)> {
        self.files.iter().filter_map(|f| match (&f.classification, &f.target_path) {
            (Classification::Convertible, Some(target)) => Some((&f.entry, target)),
            _ => None,
        })
    }

    /// Number of files with the given classification.
    pub fn count(&self, classification: Classification) -> usize {
        self.files
            .iter()
            .filter(|f| f.classification == classification)
            .count()
    }

    /// Number of mirrored directories this scan had to create.
    pub fn directories_created(&self) -> usize {
        self.directories.iter().filter(|d| d.created).count()
    }
}

/// Options that drive classification and naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub target_format: AudioFormat,
    /// Extensions that are never converted.
    pub skip_extensions: HashSet<String>,
    /// If set, only these extensions are convertible.
    pub known_input_extensions: Option<HashSet<String>>,
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

impl ScanOptions {
    /// Creates options with empty skip list and no allowlist.
    pub fn new(target_format: AudioFormat) -> Self {
        Self {
            target_format,
            skip_extensions: HashSet::new(),
            known_input_extensions: None,
        }
    }

    /// Sets the skip list.
    pub fn with_skip_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skip_extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    /// Sets the allowlist of input extensions.
    pub fn with_known_input_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known_input_extensions = Some(
            extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .collect(),
        );
        self
    }

    /// Classifies an extension (case-insensitive).
    ///
    /// The skip list wins over the allowlist, and an empty extension is
    /// never convertible.
    pub fn classify(&self, extension: &str) -> Classification {
        let ext = normalize_extension(extension);
        if self.skip_extensions.contains(&ext) {
            return Classification::ExplicitlySkipped;
        }
        if ext.is_empty() {
            return Classification::Unknown;
        }
        match &self.known_input_extensions {
            Some(known) if !known.contains(&ext) => Classification::Unknown,
            _ => Classification::Convertible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_without_allowlist() {
        let options = ScanOptions::new(AudioFormat::OggVorbis).with_skip_extensions(["jpg", ".TXT"]);
        assert_eq!(options.classify("flac"), Classification::Convertible);
        assert_eq!(options.classify("weird"), Classification::Convertible);
        assert_eq!(options.classify("JPG"), Classification::ExplicitlySkipped);
        assert_eq!(options.classify("txt"), Classification::ExplicitlySkipped);
        assert_eq!(options.classify(""), Classification::Unknown);
    }

    #[test]
    fn test_classify_with_allowlist() {
        let options = ScanOptions::new(AudioFormat::OggVorbis)
            .with_skip_extensions(["jpg"])
            .with_known_input_extensions(["flac", "mp3"]);
        assert_eq!(options.classify("FLAC"), Classification::Convertible);
        assert_eq!(options.classify("mp3"), Classification::Convertible);
        assert_eq!(options.classify("wma"), Classification::Unknown);
        assert_eq!(options.classify("jpg"), Classification::ExplicitlySkipped);
    }

    #[test]
    fn test_empty_extension_can_be_skip_listed() {
        let options = ScanOptions::new(AudioFormat::Mp3).with_skip_extensions([""]);
        assert_eq!(options.classify(""), Classification::ExplicitlySkipped);
    }
}
