//! Bounded, cancellable execution of a transcode plan.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::ExecutorConfig;
use super::types::{BatchEvent, BatchOutcome, FailureKind, FileFailure, OutputSettings};
use crate::converter::{ConversionJob, ConversionResult, Converter, ConverterError};
use crate::planner::{PlannedConversion, TranscodePlan};

/// What a worker hands back to the dispatcher.
struct ItemReport {
    index: usize,
    conversion: PlannedConversion,
    result: Result<ConversionResult, ConverterError>,
}

/// Runs the conversions of a plan through a converter.
///
/// At most `max_parallel` conversions run at once. Items are dispatched in
/// plan order; with a limit of one they also complete in plan order.
pub struct BatchExecutor<C: Converter> {
    config: ExecutorConfig,
    converter: Arc<C>,
}

impl<C: Converter + 'static> BatchExecutor<C> {
    /// Creates a new executor.
    pub fn new(config: ExecutorConfig, converter: Arc<C>) -> Self {
        Self { config, converter }
    }

    /// Returns the executor configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Executes every planned conversion.
    ///
    /// A failed conversion is recorded and the batch moves on. Once `cancel`
    /// fires nothing new is dispatched; in-flight conversions receive the same
    /// token and are awaited, so their partial outputs are gone by the time
    /// this returns. Progress is sent to `events` when a sender is given.
    pub async fn execute(
        &self,
        plan: &TranscodePlan,
        settings: OutputSettings,
        cancel: &CancellationToken,
        events: Option<mpsc::Sender<BatchEvent>>,
    ) -> BatchOutcome {
        let total = plan.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel.max(1)));
        let mut workers: JoinSet<ItemReport> = JoinSet::new();
        let mut dispatched = 0;

        info!(
            total,
            max_parallel = self.config.max_parallel,
            format = %settings.format,
            bitrate_kbps = ?settings.bitrate_kbps,
            "Starting batch"
        );

        for (index, conversion) in plan.conversions.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            if cancel.is_cancelled() {
                break;
            }

            dispatched += 1;
            let converter = Arc::clone(&self.converter);
            let conversion = conversion.clone();
            let cancel = cancel.clone();
            let events = events.clone();

            workers.spawn(async move {
                let report =
                    run_item(converter, index, total, conversion, settings, cancel, events).await;
                drop(permit);
                report
            });
        }

        // Single aggregation point for every worker result
        let mut outcome = BatchOutcome::default();
        let mut failures = Vec::new();
        while let Some(joined) = workers.join_next().await {
            let report = match joined {
                Ok(report) => report,
                // Converter panics are caught in run_item; this is the wrapper itself
                Err(e) => {
                    error!(error = %e, "Conversion worker terminated abnormally");
                    continue;
                }
            };

            match report.result {
                Ok(_) => outcome.record_success(),
                Err(e) if e.is_cancelled() => outcome.record_interrupted(),
                Err(e) => failures.push((
                    report.index,
                    FileFailure {
                        source_path: report.conversion.source.source_path,
                        target_path: report.conversion.target_path,
                        extension: report.conversion.extension,
                        kind: FailureKind::from(&e),
                        reason: e.reason(),
                    },
                )),
            }
        }

        failures.sort_by_key(|(index, _)| *index);
        for (_, failure) in failures {
            outcome.record_failure(failure);
        }

        if dispatched < total {
            outcome.cancelled = true;
            info!(
                not_dispatched = total - dispatched,
                "Batch cancelled before all conversions were dispatched"
            );
        }

        info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            failed = outcome.failed(),
            interrupted = outcome.interrupted,
            cancelled = outcome.cancelled,
            "Batch finished"
        );

        outcome
    }
}

async fn run_item<C: Converter + 'static>(
    converter: Arc<C>,
    index: usize,
    total: usize,
    conversion: PlannedConversion,
    settings: OutputSettings,
    cancel: CancellationToken,
    events: Option<mpsc::Sender<BatchEvent>>,
) -> ItemReport {
    let source = conversion.source.source_path.clone();
    let target = conversion.target_path.clone();

    emit(
        &events,
        BatchEvent::Started {
            index,
            total,
            source: source.clone(),
        },
    )
    .await;

    let job = ConversionJob::new(source.clone(), target.clone(), settings.format)
        .with_bitrate(settings.bitrate_kbps);
    let start = Instant::now();
    // Own task, so a panicking converter becomes a failure of this item only
    let result = match tokio::spawn(async move { converter.convert(job, cancel).await }).await {
        Ok(result) => result,
        Err(e) => {
            error!(source = %source.display(), error = %e, "Converter task did not complete");
            Err(ConverterError::conversion_failed(
                format!("Converter task failed: {}", e),
                None,
            ))
        }
    };

    // Never delete the input, whatever the plan says
    if result.is_err() && target != source {
        remove_partial(&target).await;
    }

    let event = match &result {
        Ok(done) => {
            info!(
                source = %source.display(),
                target = %target.display(),
                duration_ms = start.elapsed().as_millis() as u64,
                size_bytes = done.output_size_bytes,
                "Converted"
            );
            BatchEvent::Succeeded {
                index,
                total,
                source,
                target,
                duration_ms: done.duration_ms,
            }
        }
        Err(e) if e.is_cancelled() => {
            info!(source = %source.display(), "Conversion interrupted");
            BatchEvent::Cancelled {
                index,
                total,
                source,
            }
        }
        Err(e) => {
            warn!(
                source = %source.display(),
                kind = ?FailureKind::from(e),
                error = %e,
                "Conversion failed"
            );
            BatchEvent::Failed {
                index,
                total,
                source,
                reason: e.reason(),
            }
        }
    };
    emit(&events, event).await;

    ItemReport {
        index,
        conversion,
        result,
    }
}

async fn emit(events: &Option<mpsc::Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

/// Deletes whatever the converter left at `path`.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::AudioFormat;
    use crate::scanner::SourceEntry;
    use crate::testing::{MockConverter, MOCK_OUTPUT};
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    fn plan_for(dir: &TempDir, names: &[&str]) -> TranscodePlan {
        let mut plan = TranscodePlan::default();
        for name in names {
            let source_path = dir.path().join(name);
            std::fs::write(&source_path, b"audio").unwrap();
            let (stem, ext) = name.rsplit_once('.').unwrap();
            let target_path = dir.path().join(format!("{}.ogg", stem));
            plan.valid_outputs.insert(target_path.clone());
            plan.conversions.push(PlannedConversion {
                source: SourceEntry {
                    source_path,
                    relative_path: PathBuf::from(name),
                    extension: ext.to_string(),
                    size_bytes: 5,
                },
                target_path,
                extension: ext.to_string(),
            });
        }
        plan
    }

    fn executor(converter: &Arc<MockConverter>, max_parallel: usize) -> BatchExecutor<MockConverter> {
        BatchExecutor::new(
            ExecutorConfig::default().with_max_parallel(max_parallel),
            Arc::clone(converter),
        )
    }

    fn settings() -> OutputSettings {
        OutputSettings::new(AudioFormat::OggVorbis).with_bitrate(Some(160))
    }

    #[tokio::test]
    async fn test_sequential_batch_in_plan_order() {
        let dir = TempDir::new().unwrap();
        let plan = plan_for(&dir, &["a.flac", "b.mp3", "c.wav"]);
        let converter = Arc::new(MockConverter::new());
        let (tx, mut rx) = mpsc::channel(32);

        let outcome = executor(&converter, 1)
            .execute(&plan, settings(), &CancellationToken::new(), Some(tx))
            .await;

        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.succeeded, 3);
        assert!(outcome.is_complete());
        for name in ["a.ogg", "b.ogg", "c.ogg"] {
            assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), MOCK_OUTPUT);
        }

        let recorded = converter.recorded_conversions().await;
        let inputs: Vec<_> = recorded.iter().map(|r| r.job.input_path.clone()).collect();
        assert_eq!(
            inputs,
            vec![dir.path().join("a.flac"), dir.path().join("b.mp3"), dir.path().join("c.wav")]
        );
        assert_eq!(recorded[0].job.bitrate_kbps, Some(160));

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 6);
        assert!(matches!(events[0], BatchEvent::Started { index: 0, total: 3, .. }));
        assert!(matches!(events[1], BatchEvent::Succeeded { index: 0, .. }));
        assert!(matches!(events[5], BatchEvent::Succeeded { index: 2, .. }));
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_partial_removed() {
        let dir = TempDir::new().unwrap();
        let plan = plan_for(&dir, &["a.flac", "bad.wma", "c.flac", "worse.wma"]);
        let converter = Arc::new(MockConverter::new());
        converter.fail_input(dir.path().join("bad.wma")).await;
        converter.fail_input(dir.path().join("worse.wma")).await;

        let outcome = executor(&converter, 1)
            .execute(&plan, settings(), &CancellationToken::new(), None)
            .await;

        assert_eq!(outcome.attempted, 4);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed(), 2);
        assert_eq!(outcome.failed_by_extension.get("wma"), Some(&2));
        assert_eq!(outcome.failure_summary(), "2x .wma");
        assert_eq!(outcome.failures[0].source_path, dir.path().join("bad.wma"));
        assert_eq!(outcome.failures[0].kind, FailureKind::Transcode);
        assert!(outcome.failures[0].reason.contains("Invalid data"));

        assert!(!dir.path().join("bad.ogg").exists());
        assert!(!dir.path().join("worse.ogg").exists());
        assert!(dir.path().join("c.ogg").exists());
    }

    #[tokio::test]
    async fn test_panicking_conversion_counts_as_failure() {
        let dir = TempDir::new().unwrap();
        let plan = plan_for(&dir, &["a.flac", "boom.flac", "c.flac"]);
        std::fs::write(dir.path().join("boom.ogg"), b"stale").unwrap();
        let converter = Arc::new(MockConverter::new());
        converter.panic_on_input(dir.path().join("boom.flac")).await;
        let (tx, mut rx) = mpsc::channel(32);

        let outcome = executor(&converter, 1)
            .execute(&plan, settings(), &CancellationToken::new(), Some(tx))
            .await;

        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed_by_extension.get("flac"), Some(&1));
        assert_eq!(outcome.failures[0].source_path, dir.path().join("boom.flac"));
        assert_eq!(outcome.failures[0].kind, FailureKind::Transcode);
        assert!(outcome.is_complete());
        assert!(!dir.path().join("boom.ogg").exists());
        assert!(dir.path().join("c.ogg").exists());

        let mut failed = 0;
        while let Some(event) = rx.recv().await {
            if matches!(event, BatchEvent::Failed { index: 1, .. }) {
                failed += 1;
            }
        }
        assert_eq!(failed, 1);
    }

    #[tokio::test]
    async fn test_failed_in_place_conversion_keeps_source() {
        let dir = TempDir::new().unwrap();
        let source_path = dir.path().join("song.ogg");
        std::fs::write(&source_path, b"original").unwrap();
        let mut plan = TranscodePlan::default();
        plan.conversions.push(PlannedConversion {
            source: SourceEntry {
                source_path: source_path.clone(),
                relative_path: PathBuf::from("song.ogg"),
                extension: "ogg".to_string(),
                size_bytes: 8,
            },
            target_path: source_path.clone(),
            extension: "ogg".to_string(),
        });
        let converter = Arc::new(MockConverter::new());

        let outcome = executor(&converter, 1)
            .execute(&plan, settings(), &CancellationToken::new(), None)
            .await;

        assert_eq!(outcome.failed(), 1);
        assert_eq!(std::fs::read(&source_path).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_cancel_mid_batch_stops_dispatch() {
        let dir = TempDir::new().unwrap();
        let plan = plan_for(&dir, &["a.flac", "b.flac", "c.flac"]);
        let converter = Arc::new(MockConverter::new());
        converter
            .set_conversion_duration(Duration::from_millis(50))
            .await;
        let cancel = CancellationToken::new();
        converter
            .cancel_on_input(dir.path().join("b.flac"), cancel.clone())
            .await;

        let outcome = executor(&converter, 1)
            .execute(&plan, settings(), &cancel, None)
            .await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.attempted, 1);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.interrupted, 1);
        assert!(dir.path().join("a.ogg").exists());
        assert!(!dir.path().join("b.ogg").exists());
        assert!(!dir.path().join("c.ogg").exists());
        assert_eq!(converter.conversion_count().await, 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_dispatches_nothing() {
        let dir = TempDir::new().unwrap();
        let plan = plan_for(&dir, &["a.flac"]);
        let converter = Arc::new(MockConverter::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = executor(&converter, 1)
            .execute(&plan, settings(), &cancel, None)
            .await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.attempted, 0);
        assert_eq!(converter.conversion_count().await, 0);
    }

    #[tokio::test]
    async fn test_parallel_limit_is_respected() {
        let dir = TempDir::new().unwrap();
        let names: Vec<String> = (0..8).map(|i| format!("t{}.flac", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let plan = plan_for(&dir, &refs);
        let converter = Arc::new(MockConverter::new());
        converter
            .set_conversion_duration(Duration::from_millis(20))
            .await;

        let outcome = executor(&converter, 3)
            .execute(&plan, settings(), &CancellationToken::new(), None)
            .await;

        assert_eq!(outcome.succeeded, 8);
        assert!(converter.peak_concurrency() <= 3);
        assert!(converter.peak_concurrency() >= 2);
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let converter = Arc::new(MockConverter::new());
        let outcome = executor(&converter, 1)
            .execute(&TranscodePlan::default(), settings(), &CancellationToken::new(), None)
            .await;

        assert_eq!(outcome, BatchOutcome::default());
    }
}
