//! Per-image pipeline: source → name → free path → fetch → write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::error::DownloadError;
use super::filename::{resolve_collision, sanitize_filename, sanitize_or_default};
use crate::element::{ImageElement, ImageTag};
use crate::naming::ImageNamer;
use crate::timing::ScopedTimer;
use crate::urls::{extract_filename, resolve_url};

/// A downloaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Final filename on disk.
    pub name: String,
    /// Absolute URL the image was fetched from.
    pub source_url: String,
    /// Path of the written file.
    pub local_path: PathBuf,
}

/// Downloads single image elements.
#[derive(Clone)]
pub struct ImageWorker {
    client: HttpClient,
    namer: Arc<dyn ImageNamer>,
}

impl std::fmt::Debug for ImageWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageWorker")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl ImageWorker {
    /// Creates a worker fetching with `client` and naming with `namer`.
    #[must_use]
    pub fn new(client: HttpClient, namer: Arc<dyn ImageNamer>) -> Self {
        Self { client, namer }
    }

    /// Downloads the image described by `element` into `output_dir`.
    ///
    /// Returns `Ok(None)` when the element has neither `data-src` nor `src`.
    /// Names from the namer are sanitized like URL names. Naming failures and
    /// blank names fall back to the URL's last path segment. If the chosen
    /// name is already taken, a timestamped variant is used; the existing file
    /// is never touched.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the source cannot be resolved against
    /// `page_url`, the fetch fails, or the file cannot be written.
    #[instrument(skip(self, element, output_dir, page_url), fields(index))]
    pub async fn process_image(
        &self,
        element: &ImageTag,
        index: usize,
        output_dir: &Path,
        page_url: &str,
    ) -> Result<Option<DownloadResult>, DownloadError> {
        let Some(source) = element.source_url() else {
            warn!(index, markup = %element.markup(), "missing source: no data-src or src attribute");
            return Ok(None);
        };

        let fallback_name = sanitize_or_default(&extract_filename(source));

        let timer = ScopedTimer::start("naming");
        let name = self
            .namer
            .name_image(element, &fallback_name)
            .await
            .map(|name| sanitize_filename(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| fallback_name.clone());
        timer.finish();

        let (name, target) = resolve_collision(output_dir, &name);

        let resolved = resolve_url(page_url, source).map_err(|e| {
            debug!(index, error = %e, "source resolution failed");
            DownloadError::invalid_url(source)
        })?;
        debug!(index, url = %resolved, path = %target.display(), "downloading");

        let saved = self
            .client
            .download_to_new_file(&resolved, output_dir, &name)
            .await?;

        info!(index, name = %saved.name, url = %resolved, "image downloaded");
        Ok(Some(DownloadResult {
            name: saved.name,
            source_url: resolved,
            local_path: saved.path,
        }))
    }
}
