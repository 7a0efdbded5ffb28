//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Audio format a file can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// MPEG Audio Layer III
    Mp3,
    /// Ogg Vorbis
    OggVorbis,
    /// Opus
    Opus,
    /// Advanced Audio Coding in an MPEG-4 container
    Aac,
    /// Free Lossless Audio Codec (lossless)
    Flac,
    /// WAVE (uncompressed)
    Wav,
}

impl AudioFormat {
    /// All formats the converter knows how to produce.
    pub const ALL: [AudioFormat; 6] = [
        Self::Mp3,
        Self::OggVorbis,
        Self::Opus,
        Self::Aac,
        Self::Flac,
        Self::Wav,
    ];

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggVorbis => "ogg",
            Self::Opus => "opus",
            Self::Aac => "m4a",
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }

    /// Returns the ffmpeg encoder name for this format.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::OggVorbis => "libvorbis",
            Self::Opus => "libopus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "pcm_s16le",
        }
    }

    /// Whether this format is lossless.
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Flac | Self::Wav)
    }

    /// Resolves a format tag (a filename extension such as `ogg`).
    ///
    /// `aac` is accepted as an alias for `m4a`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().trim_start_matches('.').to_ascii_lowercase();
        match tag.as_str() {
            "aac" => Some(Self::Aac),
            _ => Self::ALL.into_iter().find(|f| f.extension() == tag),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One entry of the encoder or decoder catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecInfo {
    /// Filename extension this codec reads or writes.
    pub format_tag: String,
    /// External command backing the codec.
    pub command: String,
    /// Codec name as known to the command.
    pub codec: String,
    /// Whether the command and codec are present right now.
    pub available: bool,
}

/// A single file conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Path to the input file.
    pub input_path: PathBuf,
    /// Path the converted file is written to.
    pub output_path: PathBuf,
    /// Target format.
    pub format: AudioFormat,
    /// Target bitrate in kbps (ignored for lossless formats).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_kbps: Option<u32>,
}

impl ConversionJob {
    /// Creates a job without an explicit bitrate.
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        format: AudioFormat,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            format,
            bitrate_kbps: None,
        }
    }

    /// Sets the target bitrate.
    pub fn with_bitrate(mut self, bitrate_kbps: Option<u32>) -> Self {
        self.bitrate_kbps = bitrate_kbps;
        self
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Path to the output file.
    pub output_path: PathBuf,
    /// Output file size in bytes.
    pub output_size_bytes: u64,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}
