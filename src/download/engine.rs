//! Download engine: page fetch, selection and bounded concurrent downloads.
//!
//! The engine fetches the page once, selects the image elements, snapshots
//! them and spawns one Tokio task per element up front. Tasks are admitted
//! through a semaphore sized to the configured concurrency; each one waits its
//! pacing delay, runs the [`ImageWorker`] and reports progress.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use picture_downloader_core::download::{DownloadEngine, HttpClient, Pacer};
//! use picture_downloader_core::naming::UrlNamer;
//! use picture_downloader_core::pipeline::PipelineConfig;
//! use picture_downloader_core::progress::NoProgress;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new("https://example.com/gallery", "img.photo", "./pictures");
//! let engine = DownloadEngine::new(4, Pacer::new(Duration::from_millis(300)), HttpClient::new(), Arc::new(UrlNamer))?;
//! let outcomes = engine.run(&config, Arc::new(NoProgress)).await?;
//! println!("{} elements processed", outcomes.len());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::error::DownloadError;
use super::pacing::Pacer;
use super::worker::{DownloadResult, ImageWorker};
use crate::element::ImageTag;
use crate::naming::ImageNamer;
use crate::pipeline::{PipelineConfig, PipelineError};
use crate::progress::ProgressObserver;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Error type for download engine construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// What happened to one matched element.
#[derive(Debug)]
pub enum ImageOutcome {
    /// The image was saved.
    Downloaded(DownloadResult),
    /// The element had neither `data-src` nor `src`.
    MissingSource,
    /// Fetching or writing this image failed; other elements were unaffected.
    Failed(DownloadError),
}

impl ImageOutcome {
    /// Returns the download result, if the image was saved.
    #[must_use]
    pub fn result(&self) -> Option<&DownloadResult> {
        match self {
            Self::Downloaded(result) => Some(result),
            Self::MissingSource | Self::Failed(_) => None,
        }
    }

    /// Returns the error, if this element failed.
    #[must_use]
    pub fn error(&self) -> Option<&DownloadError> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Downloaded(_) | Self::MissingSource => None,
        }
    }

    fn from_worker(result: Result<Option<DownloadResult>, DownloadError>) -> Self {
        match result {
            Ok(Some(result)) => Self::Downloaded(result),
            Ok(None) => Self::MissingSource,
            Err(error) => Self::Failed(error),
        }
    }
}

/// Counts of outcomes from one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Images saved.
    pub completed: usize,
    /// Elements without a source attribute.
    pub skipped: usize,
    /// Images that failed.
    pub failed: usize,
}

impl DownloadStats {
    /// Tallies a run's outcomes.
    #[must_use]
    pub fn from_outcomes(outcomes: &[ImageOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut stats, outcome| {
            match outcome {
                ImageOutcome::Downloaded(_) => stats.completed += 1,
                ImageOutcome::MissingSource => stats.skipped += 1,
                ImageOutcome::Failed(_) => stats.failed += 1,
            }
            stats
        })
    }

    /// Returns the number of elements processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failed
    }
}

/// Download engine for one page's images.
///
/// # Concurrency Model
///
/// - Each element runs in its own Tokio task, spawned eagerly
/// - A semaphore permit is acquired before the pacing wait and released once
///   the image is written or has failed
/// - Results are collected in spawn order, so `outcomes[i]` belongs to the
///   i-th matched element
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured concurrency limit.
    concurrency: usize,
    /// Courtesy gap shared by all tasks.
    pacer: Arc<Pacer>,
    /// Client for the page fetch.
    client: HttpClient,
    /// Per-image pipeline.
    worker: ImageWorker,
}

impl std::fmt::Debug for DownloadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadEngine")
            .field("concurrency", &self.concurrency)
            .field("pacer", &self.pacer)
            .finish_non_exhaustive()
    }
}

impl DownloadEngine {
    /// Creates a new download engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use picture_downloader_core::download::{DownloadEngine, HttpClient, Pacer};
    /// use picture_downloader_core::naming::UrlNamer;
    ///
    /// let engine = DownloadEngine::new(10, Pacer::disabled(), HttpClient::new(), Arc::new(UrlNamer)).unwrap();
    /// assert_eq!(engine.concurrency(), 10);
    /// ```
    #[instrument(level = "debug", skip(pacer, client, namer))]
    pub fn new(
        concurrency: usize,
        pacer: Pacer,
        client: HttpClient,
        namer: Arc<dyn ImageNamer>,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(
            concurrency,
            pace_ms = pacer.step().as_millis(),
            pace_disabled = pacer.is_disabled(),
            "creating download engine"
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            pacer: Arc::new(pacer),
            worker: ImageWorker::new(client.clone(), namer),
            client,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Downloads every image matched by `config.selector` on `config.page_url`.
    ///
    /// Returns one outcome per matched element, in document order. Individual
    /// image failures do NOT fail the run; they appear as
    /// [`ImageOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidSelector`] if the selector does not parse
    /// - [`PipelineError::PageFetch`] if the page cannot be fetched
    /// - [`PipelineError::NoImagesFound`] if nothing matched
    #[instrument(skip(self, config, observer), fields(url = %config.page_url, selector = %config.selector))]
    pub async fn run(
        &self,
        config: &PipelineConfig,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<Vec<ImageOutcome>, PipelineError> {
        let selector = parse_selector(&config.selector)?;

        let html = self
            .client
            .fetch_page(&config.page_url)
            .await
            .map_err(|source| PipelineError::PageFetch {
                url: config.page_url.clone(),
                source,
            })?;

        let tags = select_images(&html, &selector, &config.selector)?;
        let total = tags.len();
        info!(total, concurrency = self.concurrency, "starting downloads");
        observer.started(total);

        let progress = Arc::new(AtomicUsize::new(0));
        let page_url: Arc<str> = Arc::from(config.page_url.as_str());
        let output_dir: Arc<Path> = Arc::from(config.output_dir.as_path());
        let mut handles = Vec::with_capacity(total);

        for (index, tag) in tags.into_iter().enumerate() {
            let semaphore = Arc::clone(&self.semaphore);
            let pacer = Arc::clone(&self.pacer);
            let worker = self.worker.clone();
            let progress = Arc::clone(&progress);
            let observer = Arc::clone(&observer);
            let page_url = Arc::clone(&page_url);
            let output_dir = Arc::clone(&output_dir);

            handles.push(tokio::spawn(async move {
                let Ok(permit) = semaphore.acquire_owned().await else {
                    return ImageOutcome::Failed(DownloadError::task_aborted(
                        index,
                        "semaphore closed",
                    ));
                };
                pacer.wait().await;

                let outcome = ImageOutcome::from_worker(
                    worker
                        .process_image(&tag, index, &output_dir, &page_url)
                        .await,
                );
                drop(permit);

                if let ImageOutcome::Failed(e) = &outcome {
                    warn!(index, error = %e, "image download failed");
                }
                let done = progress.fetch_add(1, Ordering::SeqCst) + 1;
                observer.advanced(done, total, outcome.result().map(|r| r.name.as_str()));
                outcome
            }));
        }

        debug!(task_count = handles.len(), "waiting for downloads to complete");

        let mut outcomes = Vec::with_capacity(total);
        for (index, handle) in handles.into_iter().enumerate() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(index, error = %e, "download task panicked");
                    let done = progress.fetch_add(1, Ordering::SeqCst) + 1;
                    observer.advanced(done, total, None);
                    ImageOutcome::Failed(DownloadError::task_aborted(index, e.to_string()))
                }
            };
            outcomes.push(outcome);
        }
        observer.finished();

        let stats = DownloadStats::from_outcomes(&outcomes);
        info!(
            completed = stats.completed,
            skipped = stats.skipped,
            failed = stats.failed,
            total = stats.total(),
            "downloads complete"
        );

        Ok(outcomes)
    }
}

fn parse_selector(selector: &str) -> Result<Selector, PipelineError> {
    Selector::parse(selector).map_err(|e| PipelineError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Parses `html` and snapshots every element matching `selector`.
///
/// Kept synchronous: `Html` is not `Send` and must not live across an await.
fn select_images(
    html: &str,
    selector: &Selector,
    selector_text: &str,
) -> Result<Vec<ImageTag>, PipelineError> {
    let document = Html::parse_document(html);
    let tags: Vec<ImageTag> = document
        .select(selector)
        .map(|element| ImageTag::from_scraped(&element))
        .collect();

    if tags.is_empty() {
        let page_text = page_text(&document);
        warn!(selector = selector_text, page_text = %page_text, "no images found");
        return Err(PipelineError::NoImagesFound {
            selector: selector_text.to_string(),
            page_text,
        });
    }

    debug!(matched = tags.len(), "elements selected");
    Ok(tags)
}

/// Visible text of the page with whitespace collapsed.
fn page_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
