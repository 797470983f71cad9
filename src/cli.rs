//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use picture_downloader_core::DEFAULT_CONCURRENCY;
use picture_downloader_core::settings::{DEFAULT_NAMING_ENDPOINT, NAMING_ENDPOINT_VAR};

/// Download the pictures on a web page.
///
/// Fetches the page, selects image elements with a CSS selector, names each
/// image (descriptively via a text-generation endpoint, or after its URL) and
/// saves it into the output directory without overwriting existing files.
#[derive(Parser, Debug)]
#[command(name = "picture-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Page to crawl
    #[arg(short = 'u', long)]
    pub url: String,

    /// CSS selector for the image elements (e.g. "img.photo")
    #[arg(short = 's', long)]
    pub selector: String,

    /// Existing directory to save images into
    #[arg(short = 'o', long)]
    pub output_dir: PathBuf,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Name images after their URL instead of asking the naming endpoint
    #[arg(long)]
    pub no_ai_naming: bool,

    /// Courtesy gap step between image requests in milliseconds (0 to disable, max 60000)
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub pace_ms: u64,

    /// Base URL of the naming endpoint
    #[arg(long, env = NAMING_ENDPOINT_VAR, default_value = DEFAULT_NAMING_ENDPOINT)]
    pub naming_endpoint: String,
}

impl Args {
    /// Returns whether descriptive naming is enabled.
    pub fn ai_naming(&self) -> bool {
        !self.no_ai_naming
    }
}
