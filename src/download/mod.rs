//! Page fetch and bounded concurrent image downloads.
//!
//! This module provides the HTTP client, the per-image worker and the engine
//! that schedules workers for every element a selector matches.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large images)
//! - Configurable timeouts (30s connect, 5min total by default)
//! - Structured error types with full context
//! - Collision-free filenames (timestamp suffix, exclusive create)
//! - Incrementing courtesy gap between requests
//!
//! # Example
//!
//! ```no_run
//! use picture_downloader_core::download::HttpClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let saved = client
//!     .download_to_new_file("https://example.com/cat.jpg", Path::new("./pictures"), "cat.jpg")
//!     .await?;
//! println!("Downloaded: {}", saved.path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;
mod filename;
mod pacing;
mod worker;

pub use client::{BROWSER_USER_AGENT, HttpClient, SavedFile};
pub use engine::{
    DEFAULT_CONCURRENCY, DownloadEngine, DownloadStats, EngineError, ImageOutcome,
    MAX_CONCURRENCY, MIN_CONCURRENCY,
};
pub use error::DownloadError;
pub use pacing::Pacer;
pub use worker::{DownloadResult, ImageWorker};

pub(crate) use filename::{sanitize_filename, timestamp_token};
