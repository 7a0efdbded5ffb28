//! Testing utilities and mock implementations.
//!
//! The mock converter stands in for FFmpeg so the whole pipeline can be
//! exercised against temporary directories without an encoder installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use treecast_core::testing::MockConverter;
//!
//! let converter = MockConverter::new();
//! converter.fail_input("/music/broken.wma").await;
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion, MOCK_OUTPUT, MOCK_PARTIAL};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::fs;
    use std::io;
    use std::path::Path;

    /// Creates a file (and its parents) under `root` with a little content.
    pub fn touch(root: &Path, relative: &str) -> io::Result<()> {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, b"fixture")
    }

    /// Creates every listed file under `root`.
    pub fn tree(root: &Path, files: &[&str]) -> io::Result<()> {
        files.iter().try_for_each(|f| touch(root, f))
    }
}
