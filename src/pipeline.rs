//! Pipeline entry point: validate the run configuration, wire the
//! collaborators and hand off to the [`DownloadEngine`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, instrument};

use crate::download::constants::DEFAULT_PACE;
use crate::download::{
    DEFAULT_CONCURRENCY, DownloadEngine, DownloadError, DownloadStats, EngineError, HttpClient,
    ImageOutcome, MAX_CONCURRENCY, MIN_CONCURRENCY, Pacer,
};
use crate::naming::{ImageNamer, NamingClient, UrlNamer};
use crate::progress::ProgressObserver;
use crate::settings::NamingSettings;
use crate::timing::ScopedTimer;

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration was rejected before any network call.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },

    /// The CSS selector does not parse.
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector {
        /// The rejected selector.
        selector: String,
        /// Parser message.
        message: String,
    },

    /// The selector matched nothing on the page.
    #[error("no images found for selector '{selector}'")]
    NoImagesFound {
        /// The selector that matched nothing.
        selector: String,
        /// The page's visible text, for diagnosing blocked or empty pages.
        page_text: String,
    },

    /// The page itself could not be fetched.
    #[error("failed to fetch page {url}: {source}")]
    PageFetch {
        /// The page URL.
        url: String,
        /// The underlying fetch error.
        #[source]
        source: DownloadError,
    },

    /// The download engine could not be created.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl PipelineError {
    /// Returns true for connection failures and timeouts of the page fetch.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::PageFetch { source, .. } if source.is_network())
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Everything one run needs. Validated once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Page to crawl.
    pub page_url: String,
    /// CSS selector for the image elements.
    pub selector: String,
    /// Existing directory to save images into.
    pub output_dir: PathBuf,
    /// Maximum simultaneous image downloads (1-100).
    pub concurrency: usize,
    /// Courtesy gap step; zero disables pacing.
    pub pace: Duration,
    /// Naming endpoint settings; `None` names images after their URL.
    pub naming: Option<NamingSettings>,
}

impl PipelineConfig {
    /// Creates a config with default concurrency and pacing and naming disabled.
    pub fn new(
        page_url: impl Into<String>,
        selector: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            page_url: page_url.into(),
            selector: selector.into(),
            output_dir: output_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
            pace: DEFAULT_PACE,
            naming: None,
        }
    }

    /// Sets the concurrency limit.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the pacing step.
    #[must_use]
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Enables descriptive naming through the given endpoint.
    #[must_use]
    pub fn with_naming(mut self, naming: NamingSettings) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Checks the configuration without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the page URL or selector is
    /// empty, the page URL is not an http(s) URL, the output directory does
    /// not exist, or the concurrency is outside 1-100. The rejected inputs
    /// are logged at error level.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let output_dir_exists = self.output_dir.is_dir();
        let reason = self.invalid_reason(output_dir_exists);

        if let Some(reason) = reason {
            error!(
                page_url = %self.page_url,
                selector = %self.selector,
                output_dir = %self.output_dir.display(),
                output_dir_exists,
                concurrency = self.concurrency,
                reason = %reason,
                "invalid pipeline configuration"
            );
            return Err(PipelineError::invalid(reason));
        }
        Ok(())
    }

    fn invalid_reason(&self, output_dir_exists: bool) -> Option<String> {
        if self.page_url.trim().is_empty() {
            return Some("page URL is empty".to_string());
        }
        match url::Url::parse(&self.page_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Some(format!("page URL '{}' is not an http(s) URL", self.page_url)),
        }
        if self.selector.trim().is_empty() {
            return Some("selector is empty".to_string());
        }
        if !output_dir_exists {
            return Some(format!(
                "output directory '{}' does not exist",
                self.output_dir.display()
            ));
        }
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Some(format!(
                "concurrency {} must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}",
                self.concurrency
            ));
        }
        None
    }
}

/// Runs a full crawl-name-download pass.
///
/// Returns one [`ImageOutcome`] per matched element, in document order.
///
/// # Errors
///
/// Returns [`PipelineError`] for an invalid configuration (before any
/// network call), an unparseable selector, a failed page fetch, or a page
/// where nothing matched. Per-image failures are reported in the outcomes.
#[instrument(skip(config, observer), fields(url = %config.page_url))]
pub async fn run_pipeline(
    config: &PipelineConfig,
    observer: Arc<dyn ProgressObserver>,
) -> Result<Vec<ImageOutcome>, PipelineError> {
    config.validate()?;

    let client = HttpClient::new();
    let namer: Arc<dyn ImageNamer> = match &config.naming {
        Some(settings) => Arc::new(NamingClient::new(&client, settings.clone())),
        None => Arc::new(UrlNamer),
    };
    let pacer = if config.pace.is_zero() {
        Pacer::disabled()
    } else {
        Pacer::new(config.pace)
    };
    let engine = DownloadEngine::new(config.concurrency, pacer, client, namer)?;

    info!(
        selector = %config.selector,
        output_dir = %config.output_dir.display(),
        concurrency = config.concurrency,
        naming = config.naming.is_some(),
        "starting pipeline"
    );

    let timer = ScopedTimer::start("pipeline");
    let outcomes = engine.run(config, observer).await;
    let elapsed = timer.finish();

    if let Ok(outcomes) = &outcomes {
        let stats = DownloadStats::from_outcomes(outcomes);
        info!(
            downloaded = stats.completed,
            total = stats.total(),
            elapsed_ms = elapsed.as_millis(),
            "pipeline finished"
        );
    }
    outcomes
}
