//! Streaming client for the text-generation naming endpoint.

use std::future::Future;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use tracing::{debug, info, instrument, trace, warn};

use super::ImageNamer;
use super::error::NamingError;
use super::prompt::{build_prompt, completion_body};
use super::stream::token_stream;
use crate::download::{HttpClient, sanitize_filename};
use crate::element::{ImageElement, ImageTag};
use crate::settings::NamingSettings;

/// Asks a text-generation endpoint for a descriptive image filename.
///
/// One streaming POST per image, no retries. Any failure is logged and turned
/// into `None` so the caller can fall back to the URL-derived name.
#[derive(Debug, Clone)]
pub struct NamingClient {
    http: reqwest::Client,
    settings: NamingSettings,
}

impl NamingClient {
    /// Creates a naming client sharing `http`'s connection pool.
    #[must_use]
    pub fn new(http: &HttpClient, settings: NamingSettings) -> Self {
        Self {
            http: http.inner().clone(),
            settings,
        }
    }

    /// Suggests a name for `element`; `None` when naming failed or came back empty.
    ///
    /// The prompt is rendered before the returned future is created, so the
    /// element does not need to outlive the call or be `Sync`.
    pub fn suggest_name<E: ImageElement + ?Sized>(
        &self,
        element: &E,
        fallback_name: &str,
    ) -> impl Future<Output = Option<String>> + Send + '_ {
        let prompt = build_prompt(element);
        let fallback_name = fallback_name.to_string();

        async move {
            info!(image = %fallback_name, "requesting name");
            match self.request_name(&prompt).await {
                Ok(raw) => {
                    let name = sanitize_filename(&raw);
                    if name.is_empty() {
                        warn!(image = %fallback_name, "naming returned an empty name");
                        return None;
                    }
                    info!(image = %fallback_name, name = %name, "name resolved");
                    Some(name)
                }
                Err(e) => {
                    warn!(
                        image = %fallback_name,
                        status = e.status(),
                        error = %e,
                        "naming failed, using fallback name"
                    );
                    None
                }
            }
        }
    }

    /// Sends `prompt` and concatenates the streamed tokens.
    ///
    /// # Errors
    ///
    /// - [`NamingError::BadResponse`] for a non-2xx status (body included)
    /// - [`NamingError::Unavailable`] / [`NamingError::Timeout`] for transport failures
    /// - [`NamingError::StreamError`] for an error event in the stream
    /// - [`NamingError::MalformedEvent`] for an undecodable `data:` line
    /// - [`NamingError::OversizedLine`] for a line past the length limit
    #[instrument(skip(self, prompt), fields(url))]
    pub async fn request_name(&self, prompt: &str) -> Result<String, NamingError> {
        let url = self.settings.completion_url();
        tracing::Span::current().record("url", url.as_str());
        debug!(prompt, "naming prompt");

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.settings.authorization())
            .header(CACHE_CONTROL, "no-cache")
            .header(CONTENT_TYPE, "application/json")
            .header(PRAGMA, "no-cache")
            .json(&completion_body(prompt))
            .send()
            .await
            .map_err(|e| NamingError::transport(url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NamingError::bad_response(url, status.as_u16(), body));
        }

        let mut tokens = token_stream(response.bytes_stream(), url);
        let mut name = String::new();
        while let Some(token) = tokens.next().await {
            let token = token?;
            trace!(token = %token, "naming token");
            name.push_str(&token);
        }

        Ok(name)
    }
}

#[async_trait]
impl ImageNamer for NamingClient {
    async fn name_image(&self, element: &ImageTag, fallback_name: &str) -> Option<String> {
        self.suggest_name(element, fallback_name).await
    }
}
