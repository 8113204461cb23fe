use crate::config::types::CaptureConfig;
use crate::core::dispatcher::dispatch;
use crate::input;
use crate::sandbox::docker::DockerProvider;
use crate::store::ResultStore;
use anyhow::Result;
use clap::Parser;
use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Dispatch sandboxed web-capture workers over a target list", long_about = None)]
struct Cli {
    /// Location for output files
    #[arg(short, long, default_value = "./out")]
    output: PathBuf,

    /// Width of the capture viewport
    #[arg(short = 'W', long, default_value_t = 1024)]
    width: u32,

    /// Height of the capture viewport
    #[arg(short = 'H', long, default_value_t = 1024)]
    height: u32,

    /// Number of worker sandboxes to spawn
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// Page load timeout in seconds
    #[arg(short, long, default_value_t = 60)]
    timeout: u64,

    /// Sandbox image to use for workers
    #[arg(short = 'I', long, default_value = "webcap/worker")]
    image: String,

    /// How many captures one sandbox performs before it is restarted
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    lifespan: u64,

    /// Shuffle the targets before dispatch (recommended)
    #[arg(short = 'S', long)]
    shuffle: bool,

    /// Skip targets whose domain already appears in the manifest
    #[arg(short, long)]
    resume: bool,

    /// CSV file whose first column lists URLs (or domains) to capture
    targets: PathBuf,
}

/// Parse arguments, assemble the run, and report the totals.
pub fn run() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Arc::new(CaptureConfig {
        output: cli.output,
        width: cli.width,
        height: cli.height,
        workers: cli.workers.max(1),
        timeout: cli.timeout,
        image: cli.image,
        lifespan: cli.lifespan,
        ..CaptureConfig::default()
    });
    let store = Arc::new(ResultStore::new(config.output.clone()));

    let mut targets = input::load_targets(&cli.targets)?;
    if cli.resume {
        targets = input::filter_completed(targets, &store.stored_domains()?);
    }
    if cli.shuffle {
        targets.shuffle(&mut rand::rng());
    }
    if targets.is_empty() {
        log::warn!("no targets to capture");
        return Ok(());
    }

    let provider = Arc::new(DockerProvider::new(config.image.clone()));
    let summary = dispatch(targets, provider, Arc::clone(&config), store)?;

    log::info!(
        "run complete: {} attempted, {} stored, {} exec failures, {} decode failures, {} reported failures, {} store failures, {} restarts",
        summary.report.attempted,
        summary.report.stored,
        summary.report.exec_failures,
        summary.report.decode_failures,
        summary.report.reported_failures,
        summary.report.store_failures,
        summary.report.restarts
    );
    if summary.failed_workers > 0 {
        log::warn!(
            "{} of {} workers were lost to sandbox failures",
            summary.failed_workers,
            summary.workers
        );
    }
    Ok(())
}
