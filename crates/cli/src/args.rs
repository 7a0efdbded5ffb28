//! Command-line arguments.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "treecast",
    version,
    about = "Converts audio files to the desired format preserving the directory structure"
)]
pub struct Args {
    /// Source directory or file
    #[arg(value_name = "SOURCE", required_unless_present = "codecs")]
    pub source: Option<PathBuf>,

    /// Target directory or file, must be of the same kind as the source
    #[arg(value_name = "TARGET", required_unless_present = "codecs")]
    pub target: Option<PathBuf>,

    /// List all encoders and decoders and whether they are installed
    #[arg(short, long)]
    pub codecs: bool,

    /// Target audio bitrate in kbps
    #[arg(short, long, value_name = "KBPS", value_parser = clap::value_parser!(u32).range(1..))]
    pub bitrate: Option<u32>,

    /// Target format as a filename extension, required for directories
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Skip files already present at the target; contents are not checked
    #[arg(short, long)]
    pub skip: bool,

    /// Re-convert files already present at the target (default)
    #[arg(long, overrides_with = "no_overwrite")]
    pub overwrite: bool,

    /// Leave files already present at the target alone
    #[arg(long, overrides_with = "overwrite")]
    pub no_overwrite: bool,

    /// Delete target files and folders with no counterpart in the source
    #[arg(short, long)]
    pub delete: bool,

    /// Number of conversions to run at once
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub jobs: Option<u64>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Configuration file (also read from TREECAST_CONFIG)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Whether existing outputs may be re-converted.
    pub fn overwrite(&self) -> bool {
        !self.no_overwrite
    }
}
