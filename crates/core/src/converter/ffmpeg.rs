//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use super::capabilities::CodecCatalog;
use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{CodecInfo, ConversionJob, ConversionResult};

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    fn command_name(&self) -> String {
        self.config.ffmpeg_path.display().to_string()
    }

    /// Builds ffmpeg arguments for an audio conversion.
    fn build_args(&self, job: &ConversionJob) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
            // Drop embedded cover art and any other video streams
            "-vn".to_string(),
            "-c:a".to_string(),
            job.format.ffmpeg_codec().to_string(),
        ];

        // Bitrate (for lossy formats)
        if !job.format.is_lossless() {
            if let Some(bitrate) = job.bitrate_kbps {
                args.extend(["-b:a".to_string(), format!("{}k", bitrate)]);
            }
        }

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        args.push(job.output_path.to_string_lossy().to_string());

        args
    }

    /// Keeps the last few non-empty stderr lines of the encoder.
    async fn collect_stderr_tail(stderr: ChildStderr) -> String {
        let mut lines = BufReader::new(stderr).lines();
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }

        Vec::from(tail).join("\n")
    }

    fn spawn_error(&self, e: std::io::Error) -> ConverterError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConverterError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            ConverterError::Io(e)
        }
    }

    /// Runs one conversion, racing the encoder against cancellation and timeout.
    async fn run_conversion(
        &self,
        job: &ConversionJob,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ConverterError> {
        let start = Instant::now();

        if cancel.is_cancelled() {
            return Err(ConverterError::Cancelled);
        }

        if !job.input_path.is_file() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        let args = self.build_args(job);
        tracing::debug!(
            input = %job.input_path.display(),
            output = %job.output_path.display(),
            codec = job.format.ffmpeg_codec(),
            "Starting ffmpeg"
        );

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(Self::collect_stderr_tail(stderr)));

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let status = tokio::select! {
            status = child.wait() => status?,
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                if let Some(task) = stderr_task {
                    task.abort();
                }
                tracing::debug!(input = %job.input_path.display(), "ffmpeg killed on cancellation");
                return Err(ConverterError::Cancelled);
            }
            _ = tokio::time::sleep(timeout_duration) => {
                let _ = child.kill().await;
                if let Some(task) = stderr_task {
                    task.abort();
                }
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        let error_output = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(ConverterError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", status.code()),
                if error_output.is_empty() {
                    None
                } else {
                    Some(error_output)
                },
            ));
        }

        // Verify output exists and get size
        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| ConverterError::conversion_failed("Output file not created", None))?;

        Ok(ConversionResult {
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Checks that the binary runs.
    async fn check_binary(&self, path: &Path) -> Result<(), ConverterError> {
        let output = Command::new(path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ConverterError::conversion_failed(
                format!("{} -version failed", path.display()),
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn encoders(&self) -> Vec<CodecInfo> {
        CodecCatalog::detect(&self.config)
            .await
            .encoder_infos(&self.command_name())
    }

    async fn decoders(&self) -> Vec<CodecInfo> {
        CodecCatalog::detect(&self.config)
            .await
            .decoder_infos(&self.command_name())
    }

    async fn convert(
        &self,
        job: ConversionJob,
        cancel: CancellationToken,
    ) -> Result<ConversionResult, ConverterError> {
        self.run_conversion(&job, &cancel).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        self.check_binary(&self.config.ffmpeg_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::AudioFormat;
    use std::path::PathBuf;

    #[test]
    fn test_build_args_mp3_with_bitrate() {
        let converter = FfmpegConverter::with_defaults();
        let job = ConversionJob::new("/in/a.flac", "/out/a.mp3", AudioFormat::Mp3)
            .with_bitrate(Some(192));

        let args = converter.build_args(&job);

        assert!(args.contains(&"libmp3lame".to_string()));
        assert!(args.contains(&"-b:a".to_string()));
        assert!(args.contains(&"192k".to_string()));
        assert_eq!(args.last().unwrap(), "/out/a.mp3");
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input_pos + 1], "/in/a.flac");
    }

    #[test]
    fn test_build_args_lossless_ignores_bitrate() {
        let converter = FfmpegConverter::with_defaults();
        let job = ConversionJob::new("/in/a.wav", "/out/a.flac", AudioFormat::Flac)
            .with_bitrate(Some(320));

        let args = converter.build_args(&job);

        assert!(args.contains(&"flac".to_string()));
        assert!(!args.contains(&"-b:a".to_string()));
    }

    #[test]
    fn test_build_args_extra_args_before_output() {
        let mut config = ConverterConfig::default();
        config.extra_ffmpeg_args = vec!["-map_metadata".to_string(), "0".to_string()];
        let converter = FfmpegConverter::new(config);
        let job = ConversionJob::new("/in/a.flac", "/out/a.ogg", AudioFormat::OggVorbis);

        let args = converter.build_args(&job);
        let n = args.len();
        assert_eq!(args[n - 3], "-map_metadata");
        assert_eq!(args[n - 2], "0");
        assert_eq!(args[n - 1], "/out/a.ogg");
    }

    #[tokio::test]
    async fn test_convert_missing_input() {
        let converter = FfmpegConverter::with_defaults();
        let job = ConversionJob::new(
            PathBuf::from("/nonexistent/input.flac"),
            PathBuf::from("/nonexistent/output.ogg"),
            AudioFormat::OggVorbis,
        );

        let result = converter.convert(job, CancellationToken::new()).await;
        assert!(matches!(result, Err(ConverterError::InputNotFound { .. })));
    }

    #[tokio::test]
    async fn test_convert_already_cancelled() {
        let converter = FfmpegConverter::with_defaults();
        let job = ConversionJob::new("/in/a.flac", "/out/a.ogg", AudioFormat::OggVorbis);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = converter.convert(job, cancel).await;
        assert!(matches!(result, Err(ConverterError::Cancelled)));
    }

    #[tokio::test]
    async fn test_convert_missing_ffmpeg() {
        let temp = tempfile::TempDir::new().unwrap();
        let input = temp.path().join("a.flac");
        std::fs::write(&input, b"not really flac").unwrap();

        let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(
            "/nonexistent/ffmpeg".into(),
        ));
        let job = ConversionJob::new(input, temp.path().join("a.ogg"), AudioFormat::OggVorbis);

        let result = converter.convert(job, CancellationToken::new()).await;
        assert!(matches!(result, Err(ConverterError::FfmpegNotFound { .. })));
    }

    #[tokio::test]
    async fn test_validate_missing_ffmpeg() {
        let converter = FfmpegConverter::new(ConverterConfig::with_ffmpeg_path(
            "/nonexistent/ffmpeg".into(),
        ));
        assert!(matches!(
            converter.validate().await,
            Err(ConverterError::FfmpegNotFound { .. })
        ));
    }
}
