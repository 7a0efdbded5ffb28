//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::converter::{
    AudioFormat, CodecInfo, ConversionJob, ConversionResult, Converter, ConverterError,
};

/// Bytes the mock writes for a finished output.
pub const MOCK_OUTPUT: &[u8] = b"mock-converted-audio";

/// Bytes the mock leaves behind when a conversion fails or is cancelled.
pub const MOCK_PARTIAL: &[u8] = b"partial";

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Fail chosen inputs, leaving a partial output behind like a real encoder would
/// - Cancel a token when a chosen input starts, to simulate an interrupt mid-batch
/// - Panic on chosen inputs
/// - Refuse jobs whose output is their input, without writing, like ffmpeg does
/// - Control which encoders are reported as available
/// - Observe peak concurrency
///
/// Successful conversions write [`MOCK_OUTPUT`] to the job's output path.
///
/// # Example
///
/// ```rust,ignore
/// use treecast_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.fail_input("/music/broken.wma").await;
///
/// let result = converter.convert(job, CancellationToken::new()).await;
///
/// let conversions = converter.recorded_conversions().await;
/// assert_eq!(conversions.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockConverter {
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Inputs whose conversion fails.
    failing_inputs: Arc<RwLock<HashSet<PathBuf>>>,
    /// Inputs whose conversion panics.
    panicking_inputs: Arc<RwLock<HashSet<PathBuf>>>,
    /// Tokens to cancel when the given input is converted.
    cancel_triggers: Arc<RwLock<HashMap<PathBuf, CancellationToken>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
    /// Formats with an available encoder.
    available_formats: Arc<RwLock<Vec<AudioFormat>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter with every encoder available.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            failing_inputs: Arc::new(RwLock::new(HashSet::new())),
            panicking_inputs: Arc::new(RwLock::new(HashSet::new())),
            cancel_triggers: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            conversion_duration_ms: Arc::new(RwLock::new(0)),
            available_formats: Arc::new(RwLock::new(AudioFormat::ALL.to_vec())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Clear recorded conversions.
    pub async fn clear_recorded(&self) {
        self.conversions.write().await.clear();
    }

    /// Make every conversion of `input` fail.
    pub async fn fail_input(&self, input: impl AsRef<Path>) {
        self.failing_inputs
            .write()
            .await
            .insert(input.as_ref().to_path_buf());
    }

    /// Make every conversion of `input` panic.
    pub async fn panic_on_input(&self, input: impl AsRef<Path>) {
        self.panicking_inputs
            .write()
            .await
            .insert(input.as_ref().to_path_buf());
    }

    /// Cancel `token` as soon as the conversion of `input` starts.
    pub async fn cancel_on_input(&self, input: impl AsRef<Path>, token: CancellationToken) {
        self.cancel_triggers
            .write()
            .await
            .insert(input.as_ref().to_path_buf(), token);
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Restrict the formats reported as having an encoder.
    pub async fn set_available_formats(&self, formats: Vec<AudioFormat>) {
        *self.available_formats.write().await = formats;
    }

    /// Highest number of conversions that ran at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn take_error(&self) -> Option<ConverterError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, job: ConversionJob, success: bool) {
        self.conversions
            .write()
            .await
            .push(RecordedConversion { job, success });
    }

    async fn run(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if cancel.is_cancelled() {
            return Err(ConverterError::Cancelled);
        }

        if let Some(token) = self.cancel_triggers.read().await.get(&job.input_path) {
            token.cancel();
        }
        if job.input_path == job.output_path {
            return Err(ConverterError::conversion_failed(
                "mock encoder refused to overwrite its input",
                Some(format!(
                    "Output {} same as Input #0 - exiting",
                    job.output_path.display()
                )),
            ));
        }

        // Like a real encoder, output exists before the work is done
        tokio::fs::write(&job.output_path, MOCK_PARTIAL).await?;

        let duration_ms = *self.conversion_duration_ms.read().await;
        tokio::select! {
            _ = cancel.cancelled() => return Err(ConverterError::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(duration_ms)) => {}
        }

        if self.failing_inputs.read().await.contains(&job.input_path) {
            return Err(ConverterError::conversion_failed(
                "mock encoder rejected input",
                Some(format!("{}: Invalid data found when processing input", job.input_path.display())),
            ));
        }

        tokio::fs::write(&job.output_path, MOCK_OUTPUT).await?;

        Ok(ConversionResult {
            output_path: job.output_path.clone(),
            output_size_bytes: MOCK_OUTPUT.len() as u64,
            duration_ms,
        })
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn encoders(&self) -> Vec<CodecInfo> {
        let available = self.available_formats.read().await;
        AudioFormat::ALL
            .iter()
            .map(|f| CodecInfo {
                format_tag: f.extension().to_string(),
                command: "mock".to_string(),
                codec: f.ffmpeg_codec().to_string(),
                available: available.contains(f),
            })
            .collect()
    }

    async fn decoders(&self) -> Vec<CodecInfo> {
        ["flac", "mp3", "wav", "ogg", "wma"]
            .iter()
            .map(|tag| CodecInfo {
                format_tag: tag.to_string(),
                command: "mock".to_string(),
                codec: tag.to_string(),
                available: *tag != "wma",
            })
            .collect()
    }

    async fn convert(
        &self,
        job: ConversionJob,
        cancel: CancellationToken,
    ) -> Result<ConversionResult, ConverterError> {
        if self.panicking_inputs.read().await.contains(&job.input_path) {
            panic!("mock converter panicked on {}", job.input_path.display());
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.run(&job, &cancel).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.record(job, result.is_ok()).await;
        result
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }
}
