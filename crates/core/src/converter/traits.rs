//! Trait definitions for the converter module.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::ConverterError;
use super::types::{AudioFormat, CodecInfo, ConversionJob, ConversionResult};

/// A converter that can transcode a single media file.
///
/// Implementations only ever write to `job.output_path`. Removing a partial
/// output after a failure or cancellation is the caller's job.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Lists the encoders, probing the environment on every call.
    async fn encoders(&self) -> Vec<CodecInfo>;

    /// Lists the decoders, probing the environment on every call.
    async fn decoders(&self) -> Vec<CodecInfo>;

    /// Converts a file, returning promptly with `Cancelled` once `cancel` fires.
    async fn convert(
        &self,
        job: ConversionJob,
        cancel: CancellationToken,
    ) -> Result<ConversionResult, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;

    /// Resolves a format tag to a format with an available encoder.
    async fn resolve_format(&self, tag: &str) -> Result<AudioFormat, ConverterError> {
        let unsupported = || ConverterError::UnsupportedFormat {
            format: tag.to_string(),
        };
        let format = AudioFormat::from_tag(tag).ok_or_else(unsupported)?;

        let available = self
            .encoders()
            .await
            .iter()
            .any(|e| e.available && e.format_tag == format.extension());
        if available {
            Ok(format)
        } else {
            Err(unsupported())
        }
    }
}
