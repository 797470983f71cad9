//! Picture Downloader Core Library
//!
//! This library crawls a single web page, selects image elements with a CSS
//! selector, asks a text-generation endpoint for a descriptive name for each
//! image (falling back to the URL's filename), and downloads the images with
//! bounded concurrency.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`pipeline`] - Run configuration, validation and the entry point
//! - [`download`] - Page fetch, per-image worker and the concurrent engine
//! - [`naming`] - Streaming naming client and the [`naming::ImageNamer`] seam
//! - [`element`] - Attribute/markup view over matched elements
//! - [`urls`] - URL resolution and filename extraction
//! - [`settings`] - Naming endpoint credentials
//! - [`progress`] - Progress reporting seam
//! - [`timing`] - Elapsed-time measurement

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod element;
pub mod naming;
pub mod pipeline;
pub mod progress;
pub mod settings;
pub mod timing;
pub mod urls;
mod user_agent;

// Re-export commonly used types
pub use download::{
    DEFAULT_CONCURRENCY, DownloadEngine, DownloadError, DownloadResult, DownloadStats,
    EngineError, HttpClient, ImageOutcome,
};
pub use element::{ImageElement, ImageTag};
pub use naming::{ImageNamer, NamingClient, NamingError, UrlNamer};
pub use pipeline::{PipelineConfig, PipelineError, run_pipeline};
pub use progress::{NoProgress, ProgressObserver};
pub use settings::{NamingSettings, SettingsError};
