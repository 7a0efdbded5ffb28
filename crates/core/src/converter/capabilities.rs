//! Encoder and decoder availability detection.

use regex_lite::Regex;
use std::collections::HashSet;
use std::process::Stdio;
use tokio::process::Command;

use super::config::ConverterConfig;
use super::types::{AudioFormat, CodecInfo};

/// Input formats and the ffmpeg decoder that reads them.
const DECODERS: &[(&str, &str)] = &[
    ("mp3", "mp3"),
    ("ogg", "vorbis"),
    ("opus", "opus"),
    ("m4a", "aac"),
    ("aac", "aac"),
    ("flac", "flac"),
    ("wav", "pcm_s16le"),
    ("wma", "wmav2"),
    ("ape", "ape"),
    ("alac", "alac"),
];

/// Snapshot of the codecs ffmpeg reported when it was probed.
#[derive(Debug, Clone, Default)]
pub struct CodecCatalog {
    /// Whether the ffmpeg binary could be run at all.
    pub ffmpeg_found: bool,
    /// Encoder names from `ffmpeg -encoders`.
    pub encoders: HashSet<String>,
    /// Decoder names from `ffmpeg -decoders`.
    pub decoders: HashSet<String>,
}

impl CodecCatalog {
    /// Probe ffmpeg for its encoders and decoders.
    ///
    /// A missing binary yields an empty catalog rather than an error.
    pub async fn detect(config: &ConverterConfig) -> Self {
        let encoders = Self::list(config, "-encoders").await;
        let decoders = Self::list(config, "-decoders").await;

        Self {
            ffmpeg_found: encoders.is_some() || decoders.is_some(),
            encoders: encoders.unwrap_or_default(),
            decoders: decoders.unwrap_or_default(),
        }
    }

    async fn list(config: &ConverterConfig, flag: &str) -> Option<HashSet<String>> {
        let output = Command::new(&config.ffmpeg_path)
            .args(["-hide_banner", flag])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(o) if o.status.success() => {
                Some(Self::parse_listing(&String::from_utf8_lossy(&o.stdout)))
            }
            Ok(o) => {
                tracing::debug!(status = ?o.status.code(), flag, "ffmpeg codec listing failed");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, flag, "ffmpeg could not be started");
                None
            }
        }
    }

    /// Parses the table printed by `ffmpeg -encoders` / `ffmpeg -decoders`.
    ///
    /// Each codec line starts with a six character flag field followed by the
    /// codec name, e.g. ` A....D libmp3lame  libmp3lame MP3 (MPEG audio layer 3)`.
    pub fn parse_listing(stdout: &str) -> HashSet<String> {
        let Ok(line_re) = Regex::new(r"^\s*[VASD.][A-Z.]{5}\s+([A-Za-z0-9_-]+)\s") else {
            return HashSet::new();
        };

        stdout
            .lines()
            .filter_map(|line| line_re.captures(line))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }

    /// Encoder catalog entries, one per producible format.
    pub fn encoder_infos(&self, command: &str) -> Vec<CodecInfo> {
        AudioFormat::ALL
            .iter()
            .map(|format| CodecInfo {
                format_tag: format.extension().to_string(),
                command: command.to_string(),
                codec: format.ffmpeg_codec().to_string(),
                available: self.ffmpeg_found && self.encoders.contains(format.ffmpeg_codec()),
            })
            .collect()
    }

    /// Decoder catalog entries, one per readable format.
    pub fn decoder_infos(&self, command: &str) -> Vec<CodecInfo> {
        DECODERS
            .iter()
            .map(|(tag, codec)| CodecInfo {
                format_tag: (*tag).to_string(),
                command: command.to_string(),
                codec: (*codec).to_string(),
                available: self.ffmpeg_found && self.decoders.contains(*codec),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODERS_OUTPUT: &str = "Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 A....D aac                  AAC (Advanced Audio Coding)
 A....D flac                 FLAC (Free Lossless Audio Codec)
 A....D libmp3lame           libmp3lame MP3 (MPEG audio layer 3) (codec mp3)
 A....D pcm_s16le            PCM signed 16-bit little-endian
";

    #[test]
    fn test_parse_listing() {
        let names = CodecCatalog::parse_listing(ENCODERS_OUTPUT);
        assert!(names.contains("libmp3lame"));
        assert!(names.contains("aac"));
        assert!(names.contains("libx264"));
        assert!(!names.contains("libvorbis"));
        assert!(!names.contains("------"));
    }

    #[test]
    fn test_encoder_infos_availability() {
        let catalog = CodecCatalog {
            ffmpeg_found: true,
            encoders: CodecCatalog::parse_listing(ENCODERS_OUTPUT),
            decoders: HashSet::new(),
        };
        let infos = catalog.encoder_infos("ffmpeg");
        assert_eq!(infos.len(), AudioFormat::ALL.len());

        let mp3 = infos.iter().find(|i| i.format_tag == "mp3").unwrap();
        assert!(mp3.available);
        assert_eq!(mp3.codec, "libmp3lame");

        let ogg = infos.iter().find(|i| i.format_tag == "ogg").unwrap();
        assert!(!ogg.available);
    }

    #[test]
    fn test_default_catalog_has_nothing_available() {
        let catalog = CodecCatalog::default();
        assert!(catalog.encoder_infos("ffmpeg").iter().all(|i| !i.available));
        assert!(catalog.decoder_infos("ffmpeg").iter().all(|i| !i.available));
    }

    #[tokio::test]
    async fn test_detect_missing_binary() {
        let config = ConverterConfig::with_ffmpeg_path("/nonexistent/ffmpeg".into());
        let catalog = CodecCatalog::detect(&config).await;
        assert!(!catalog.ffmpeg_found);
        assert!(catalog.encoders.is_empty());
    }
}
