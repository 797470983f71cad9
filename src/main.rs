//! CLI entry point for the picture downloader.

use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use picture_downloader_core::{
    DownloadStats, ImageOutcome, NamingSettings, PipelineConfig, PipelineError, run_pipeline,
};
use tracing::{debug, error, info, warn};

mod cli;
mod progress_bar;

use cli::Args;
use progress_bar::{BarProgress, should_show_bar};

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    Success,
    Failure,
    Network,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => Self::SUCCESS,
            ProcessExit::Failure => Self::from(1),
            ProcessExit::Network => Self::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env first so clap's env fallbacks can see it
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(&args);

    match run(args).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            error!(error = %format!("{e:#}"), "picture downloader failed");
            eprintln!("error: {e:#}");
            ProcessExit::Failure.into()
        }
    }
}

fn init_tracing(args: &Args) {
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

async fn run(args: Args) -> Result<ProcessExit> {
    debug!(?args, "CLI arguments parsed");

    let mut config = PipelineConfig::new(&args.url, &args.selector, &args.output_dir)
        .with_concurrency(usize::from(args.concurrency))
        .with_pace(Duration::from_millis(args.pace_ms));

    if args.ai_naming() {
        let settings = NamingSettings::from_env(Some(&args.naming_endpoint))
            .context("descriptive naming needs credentials (or pass --no-ai-naming)")?;
        debug!(endpoint = settings.endpoint(), "naming enabled");
        config = config.with_naming(settings);
    } else {
        info!("naming disabled, images are named after their URL");
    }

    let observer = Arc::new(BarProgress::new(should_show_bar(
        std::io::stderr().is_terminal(),
        args.quiet,
    )));

    match run_pipeline(&config, observer).await {
        Ok(outcomes) => Ok(report(&outcomes)),
        Err(PipelineError::NoImagesFound { selector, page_text }) => {
            warn!(selector = %selector, "no images found on the page");
            debug!(page_text = %page_text, "page text");
            Ok(ProcessExit::Success)
        }
        Err(e) if e.is_network() => {
            error!(error = %e, "could not reach the page");
            eprintln!("error: {e}");
            Ok(ProcessExit::Network)
        }
        Err(e) => Err(e.into()),
    }
}

/// Prints the saved filenames and maps the outcome counts to an exit code.
fn report(outcomes: &[ImageOutcome]) -> ProcessExit {
    for result in outcomes.iter().filter_map(ImageOutcome::result) {
        println!("{}", result.name);
    }

    let stats = DownloadStats::from_outcomes(outcomes);
    info!(
        downloaded = stats.completed,
        skipped = stats.skipped,
        failed = stats.failed,
        total = stats.total(),
        "download complete"
    );
    determine_exit_outcome(stats.completed, stats.failed)
}

fn determine_exit_outcome(completed: usize, failed: usize) -> ProcessExit {
    if failed > 0 && completed == 0 {
        ProcessExit::Failure
    } else {
        ProcessExit::Success
    }
}
