//! Scanner module for walking the source tree.
//!
//! The scanner mirrors every source directory under the target root, classifies
//! each file by extension, and computes the output path of every convertible
//! file. Directories are created eagerly so later writes never miss a parent.
//!
//! # Example
//!
//! ```ignore
//! use treecast_core::scanner::{Scanner, ScanOptions};
//! use treecast_core::converter::AudioFormat;
//!
//! let options = ScanOptions::new(AudioFormat::OggVorbis).with_skip_extensions(["jpg", "txt"]);
//! let result = Scanner::new(options).scan(Path::new("/music"), Path::new("/music-ogg"))?;
//! for (entry, target) in result.convertible() {
//!     println!("{} -> {}", entry.relative_path.display(), target.display());
//! }
//! ```

mod error;
mod naming;
mod scan;
mod types;

pub use error::ScanError;
pub use naming::{split_extension, target_relative_path};
pub use scan::Scanner;
pub use types::{
    Classification, MirroredDirectory, ScanOptions, ScanResult, ScannedFile, SourceEntry,
    TargetCollision,
};
