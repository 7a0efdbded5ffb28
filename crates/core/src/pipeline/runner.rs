//! Phase-by-phase driver for a mirrored-tree run.
//!
//! Phases run strictly in order: validate, scan, plan, execute, reconcile.
//! Validation happens before anything is written; the executor is the only
//! phase that talks to the converter.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::PipelineError;
use super::types::{PreparedRun, SingleFileOutcome};
use crate::config::{validate_config, Config};
use crate::converter::{AudioFormat, ConversionJob, Converter};
use crate::executor::{BatchEvent, BatchExecutor, BatchOutcome, OutputSettings};
use crate::planner::{build_plan, ExistingOutputs, PlanPolicy};
use crate::reconciler::{DeletionCandidate, ReconcileReport, Reconciler};
use crate::scanner::{split_extension, Scanner};

/// Drives scan, plan, execute and reconcile over one converter.
pub struct TranscodePipeline<C: Converter + 'static> {
    config: Config,
    converter: Arc<C>,
}

impl<C: Converter + 'static> TranscodePipeline<C> {
    /// Create a new pipeline.
    pub fn new(config: Config, converter: Arc<C>) -> Self {
        Self { config, converter }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn converter(&self) -> &Arc<C> {
        &self.converter
    }

    /// Resolves a format tag against the converter's available encoders.
    pub async fn resolve_format(&self, tag: &str) -> Result<AudioFormat, PipelineError> {
        self.converter
            .resolve_format(tag)
            .await
            .map_err(|_| PipelineError::InvalidFormat {
                format: tag.to_string(),
            })
    }

    /// Validates everything, then scans and plans.
    ///
    /// The only filesystem mutation is the creation of mirrored directories,
    /// and it happens after every check has passed.
    pub async fn prepare(
        &self,
        source_root: &Path,
        target_root: &Path,
        format_tag: Option<&str>,
        policy: PlanPolicy,
    ) -> Result<PreparedRun, PipelineError> {
        validate_config(&self.config)?;

        if !source_root.is_dir() {
            return Err(PipelineError::SourceNotFound {
                path: source_root.to_path_buf(),
            });
        }
        if !target_root.is_dir() {
            return Err(PipelineError::TargetNotFound {
                path: target_root.to_path_buf(),
            });
        }
        let format_tag = format_tag.ok_or(PipelineError::MissingFormat)?;
        let format = self.resolve_format(format_tag).await?;

        let source_root = canonical(source_root, |path| PipelineError::SourceNotFound { path })?;
        let target_root = canonical(target_root, |path| PipelineError::TargetNotFound { path })?;
        if source_root == target_root {
            return Err(PipelineError::SameSourceAndTarget { path: source_root });
        }

        info!(
            source = %source_root.display(),
            target = %target_root.display(),
            format = %format,
            skip_if_present = policy.skip_if_present,
            overwrite = policy.overwrite,
            "Preparing run"
        );

        let scanner = Scanner::new(self.config.scan.scan_options(format));
        let (src, tgt) = (source_root.clone(), target_root.clone());
        let (scan, existing) = tokio::task::spawn_blocking(move || {
            let scan = scanner.scan(&src, &tgt)?;
            let existing = ExistingOutputs::collect(&tgt);
            Ok::<_, PipelineError>((scan, existing))
        })
        .await
        .map_err(|e| PipelineError::TaskFailed(e.to_string()))??;

        let plan = build_plan(&scan, &existing, policy);

        Ok(PreparedRun {
            source_root,
            target_root,
            format,
            scan,
            plan,
        })
    }

    /// Runs the planned conversions.
    pub async fn execute(
        &self,
        run: &PreparedRun,
        bitrate_kbps: Option<u32>,
        cancel: &CancellationToken,
        events: Option<mpsc::Sender<BatchEvent>>,
    ) -> BatchOutcome {
        let executor = BatchExecutor::new(self.config.executor.clone(), Arc::clone(&self.converter));
        let settings = OutputSettings::new(run.format).with_bitrate(bitrate_kbps);
        executor.execute(&run.plan, settings, cancel, events).await
    }

    fn reconciler(run: &PreparedRun) -> Reconciler {
        Reconciler::new(&run.target_root, &run.source_root)
    }

    /// Lists target files that no source file accounts for. Deletes nothing.
    ///
    /// Walks the target tree afresh, so it reflects what the batch wrote.
    pub async fn find_orphans(
        &self,
        run: &PreparedRun,
    ) -> Result<Vec<DeletionCandidate>, PipelineError> {
        let reconciler = Self::reconciler(run);
        let valid = run.plan.valid_outputs.clone();
        tokio::task::spawn_blocking(move || reconciler.find_orphans(&valid))
            .await
            .map_err(|e| PipelineError::TaskFailed(e.to_string()))
    }

    /// Deletes confirmed orphans and prunes empty directories.
    pub async fn reconcile(
        &self,
        run: &PreparedRun,
        candidates: Vec<DeletionCandidate>,
    ) -> Result<ReconcileReport, PipelineError> {
        let reconciler = Self::reconciler(run);
        tokio::task::spawn_blocking(move || reconciler.apply(&candidates))
            .await
            .map_err(|e| PipelineError::TaskFailed(e.to_string()))
    }

    /// Converts one file.
    ///
    /// Without an explicit format tag the format follows the output file's
    /// extension. A failed or cancelled conversion leaves no output behind.
    pub async fn convert_single(
        &self,
        input: &Path,
        output: &Path,
        format_tag: Option<&str>,
        bitrate_kbps: Option<u32>,
        skip_if_present: bool,
        cancel: &CancellationToken,
    ) -> Result<SingleFileOutcome, PipelineError> {
        validate_config(&self.config)?;

        if !input.is_file() {
            return Err(PipelineError::SourceNotFound {
                path: input.to_path_buf(),
            });
        }
        if is_same_file(input, output) {
            return Err(PipelineError::SameSourceAndTarget {
                path: output.to_path_buf(),
            });
        }

        let output_name = output
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let tag = match format_tag {
            Some(tag) => tag.to_string(),
            None => split_extension(&output_name).1.to_string(),
        };
        if tag.is_empty() {
            return Err(PipelineError::MissingFormat);
        }
        let format = self.resolve_format(&tag).await?;

        if skip_if_present && output.is_file() {
            info!(output = %output.display(), "Target file already exists, nothing to do");
            return Ok(SingleFileOutcome::AlreadyPresent {
                output_path: output.to_path_buf(),
            });
        }

        let job = ConversionJob::new(input, output, format).with_bitrate(bitrate_kbps);
        match self.converter.convert(job, cancel.clone()).await {
            Ok(result) => Ok(SingleFileOutcome::Converted(result)),
            Err(e) => {
                remove_partial(output).await;
                Err(e.into())
            }
        }
    }
}

fn canonical(
    path: &Path,
    not_found: impl FnOnce(PathBuf) -> PipelineError,
) -> Result<PathBuf, PipelineError> {
    path.canonicalize().map_err(|e| {
        debug!(path = %path.display(), error = %e, "Failed to canonicalize");
        not_found(path.to_path_buf())
    })
}

/// True when both paths name the same file, following symlinks.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}
