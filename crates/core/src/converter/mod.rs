//! Converter module for transcoding audio files.
//!
//! This module provides the `Converter` trait, the gateway between the batch
//! engine and the external encoder, and an implementation backed by FFmpeg.
//!
//! # Features
//!
//! - Audio transcoding (MP3, Vorbis, Opus, AAC, FLAC, WAV)
//! - Encoder/decoder catalog with live availability checks
//! - Cancellation of an in-flight conversion through a `CancellationToken`
//! - Per-conversion timeout
//!
//! # Example
//!
//! ```ignore
//! use treecast_core::converter::{FfmpegConverter, Converter, ConversionJob, AudioFormat};
//! use tokio_util::sync::CancellationToken;
//!
//! let converter = FfmpegConverter::with_defaults();
//!
//! for enc in converter.encoders().await {
//!     println!("{} {} {}", enc.command, enc.available, enc.format_tag);
//! }
//!
//! let job = ConversionJob::new("/music/a.flac", "/out/a.ogg", AudioFormat::OggVorbis)
//!     .with_bitrate(Some(192));
//! let result = converter.convert(job, CancellationToken::new()).await?;
//! println!("Converted in {} ms", result.duration_ms);
//! ```

mod capabilities;
mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use capabilities::CodecCatalog;
pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{AudioFormat, CodecInfo, ConversionJob, ConversionResult};
