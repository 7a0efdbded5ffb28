mod args;
mod commands;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use treecast_core::{load_config_or_default, validate_config, FfmpegConverter, TranscodePipeline};

use args::Args;

/// Environment variable naming the configuration file
const CONFIG_ENV: &str = "TREECAST_CONFIG";

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            1
        }
    };
    // A prompt may still be blocked on stdin; do not wait for it
    std::process::exit(code);
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine config path
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

    let mut config = load_config_or_default(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    if let Some(jobs) = args.jobs {
        config.executor.max_parallel = usize::try_from(jobs).context("Too many jobs")?;
    }
    validate_config(&config).context("Configuration validation failed")?;
    info!(
        ffmpeg = %config.converter.ffmpeg_path.display(),
        max_parallel = config.executor.max_parallel,
        "Configuration loaded"
    );

    let converter = Arc::new(FfmpegConverter::new(config.converter.clone()));

    if args.codecs {
        commands::list_codecs(&converter).await;
        return Ok(());
    }

    let (Some(source), Some(target)) = (args.source.clone(), args.target.clone()) else {
        anyhow::bail!("Both a source and a target are required");
    };
    if !source.exists() {
        anyhow::bail!("Source does not exist: {}", source.display());
    }

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let pipeline = TranscodePipeline::new(config, converter);
    if source.is_file() {
        commands::convert_file(&pipeline, &args, &source, &target, &cancel).await
    } else {
        commands::mirror_tree(&pipeline, &args, &source, &target, &cancel).await
    }
}

/// Cancel on Ctrl+C or SIGTERM
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Interrupt received, cancelling");
    cancel.cancel();
}
