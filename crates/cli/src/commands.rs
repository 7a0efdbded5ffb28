//! The three things treecast can do: list codecs, convert a file, mirror a tree.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use treecast_core::converter::Converter;
use treecast_core::{
    BatchEvent, BatchOutcome, FailureKind, FfmpegConverter, PipelineError, PlanPolicy,
    ReconcileReport, SingleFileOutcome, TranscodePipeline,
};

use crate::args::Args;
use crate::ui::{self, green, red, CODECS_HINT};

const EVENT_BUFFER: usize = 64;

type Pipeline = TranscodePipeline<FfmpegConverter>;

pub async fn list_codecs(converter: &Arc<FfmpegConverter>) {
    ui::print_codec_table("Encoders", "ENCODER", &converter.encoders().await);
    ui::print_codec_table("Decoders", "DECODER", &converter.decoders().await);
}

pub async fn convert_file(
    pipeline: &Pipeline,
    args: &Args,
    input: &Path,
    output: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    if args.skip && output.is_file() {
        println!("Target file already exists, nothing to do");
        return Ok(());
    }

    ui::print_inline(&format!("Converting {} ... ", input.display()));
    let result = pipeline
        .convert_single(
            input,
            output,
            args.format.as_deref(),
            args.bitrate,
            args.skip,
            cancel,
        )
        .await;

    match result {
        Ok(SingleFileOutcome::Converted(_)) => println!("{}", green("OK")),
        Ok(SingleFileOutcome::AlreadyPresent { .. }) => {
            println!("Target file already exists, nothing to do")
        }
        Err(PipelineError::Conversion(e)) if e.is_cancelled() => println!("{}", red("Canceled")),
        Err(PipelineError::Conversion(e)) => {
            println!("{}", red(&e.reason()));
            println!("{}", CODECS_HINT);
        }
        Err(e) if e.is_configuration_error() => {
            println!();
            return Err(e.into());
        }
        Err(e) => {
            println!("{}", red(&e.to_string()));
            println!("{}", CODECS_HINT);
        }
    }
    Ok(())
}

pub async fn mirror_tree(
    pipeline: &Pipeline,
    args: &Args,
    source: &Path,
    target: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let policy = PlanPolicy {
        skip_if_present: args.skip,
        overwrite: args.overwrite(),
    };
    let run = pipeline
        .prepare(source, target, args.format.as_deref(), policy)
        .await
        .context("Cannot start conversion")?;

    println!(
        "{} files to convert, skipped {} already present in target directory",
        run.to_convert(),
        run.skipped_present()
    );
    if run.plan.counts.refused_overwrite > 0 {
        println!(
            "Left {} existing files alone, overwriting is disabled",
            run.plan.counts.refused_overwrite
        );
    }

    if !run.plan.is_empty() {
        if !ui::confirm("Continue?", args.yes, cancel).await? {
            println!("{}", red("Canceled"));
            return Ok(());
        }
    } else if !args.delete {
        println!("Nothing to do");
        return Ok(());
    }

    let outcome = execute_with_progress(pipeline, &run, args.bitrate, cancel).await;
    print_summary(&outcome);

    if outcome.cancelled {
        println!("{}", red("Canceled"));
        return Ok(());
    }

    if args.delete {
        let orphans = pipeline.find_orphans(&run).await?;
        for orphan in &orphans {
            println!("Will delete: {}", orphan.path.display());
        }
        println!(
            "Will delete {} invalid files in target directory",
            orphans.len()
        );
        if !orphans.is_empty() && !ui::confirm("Continue?", args.yes, cancel).await? {
            println!("{}", red("Canceled"));
            return Ok(());
        }
        let report = pipeline.reconcile(&run, orphans).await?;
        print_reconcile_report(&report);
    }

    println!("{}", green("Finished"));
    Ok(())
}

async fn execute_with_progress(
    pipeline: &Pipeline,
    run: &treecast_core::PreparedRun,
    bitrate_kbps: Option<u32>,
    cancel: &CancellationToken,
) -> BatchOutcome {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let sequential = pipeline.config().executor.max_parallel <= 1;
    let printer = tokio::spawn(print_events(rx, sequential));

    let outcome = pipeline.execute(run, bitrate_kbps, cancel, Some(tx)).await;

    if let Err(e) = printer.await {
        debug!(error = %e, "Progress printer stopped early");
    }
    outcome
}

/// Sequential runs print `Converting ... ` before the result lands on the
/// same line; parallel runs print one full line per finished file.
async fn print_events(mut rx: mpsc::Receiver<BatchEvent>, sequential: bool) {
    while let Some(event) = rx.recv().await {
        match event {
            BatchEvent::Started {
                index,
                total,
                source,
            } => {
                if sequential {
                    ui::print_inline(&format!(
                        "[{}/{}] Converting {} ... ",
                        index + 1,
                        total,
                        source.display()
                    ));
                }
            }
            BatchEvent::Succeeded {
                index,
                total,
                source,
                ..
            } => print_result(sequential, index, total, &source, &green("OK")),
            BatchEvent::Failed {
                index,
                total,
                source,
                reason,
            } => print_result(sequential, index, total, &source, &red(&reason)),
            BatchEvent::Cancelled {
                index,
                total,
                source,
            } => print_result(sequential, index, total, &source, &red("Canceled")),
        }
    }
}

fn print_result(sequential: bool, index: usize, total: usize, source: &Path, result: &str) {
    if sequential {
        println!("{}", result);
    } else {
        println!(
            "[{}/{}] Converting {} ... {}",
            index + 1,
            total,
            source.display(),
            result
        );
    }
}

fn print_summary(outcome: &BatchOutcome) {
    info!(
        attempted = outcome.attempted,
        succeeded = outcome.succeeded,
        failed = outcome.failed(),
        "Batch summary"
    );
    if outcome.succeeded > 0 {
        println!(
            "{}",
            green(&format!("Successfully transcoded {} files", outcome.succeeded))
        );
    }
    if outcome.failed() > 0 {
        println!(
            "{}",
            red(&format!("Failed to transcode: {}", outcome.failure_summary()))
        );
        let io_failures = outcome.failures_of(FailureKind::Io);
        if io_failures > 0 {
            println!(
                "{}",
                red(&format!(
                    "{} of them could not be read or written, check permissions and free space",
                    io_failures
                ))
            );
        }
        if outcome.failures_of(FailureKind::Transcode) > 0 {
            println!("{}", CODECS_HINT);
        }
    }
}

fn print_reconcile_report(report: &ReconcileReport) {
    for dir in &report.pruned_directories {
        println!("Deleted empty directory: {}", dir.display());
    }
    for path in &report.guard_trips {
        println!(
            "{}",
            red(&format!(
                "Refused to delete {}: it is inside the source directory",
                path.display()
            ))
        );
    }
    for failure in &report.failures {
        println!("{}", red(&failure.to_string()));
    }
}
