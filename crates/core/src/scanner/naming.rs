//! File name helpers for deriving target names.

use std::path::{Path, PathBuf};

use crate::converter::AudioFormat;

/// Splits a file name into `(stem, extension)` at the final `.`.
///
/// Only the last extension token is removed; `a.b.mp3` yields `("a.b", "mp3")`.
/// A name without a `.` (or whose only `.` is a leading one, as in `.hidden`)
/// has an empty extension.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (&file_name[..idx], &file_name[idx + 1..]),
        _ => (file_name, ""),
    }
}

/// Builds the output path by swapping the final extension for `format`.
///
/// Works on the raw `OsStr`, so names that are not valid UTF-8 keep their
/// bytes. Only called for files with a non-empty extension.
pub fn target_relative_path(relative: &Path, format: AudioFormat) -> PathBuf {
    relative.with_extension(format.extension())
}
