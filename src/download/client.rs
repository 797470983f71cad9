//! HTTP client wrapper for page and image fetches.
//!
//! This module provides the `HttpClient` struct which fetches the page HTML
//! and streams image bodies to disk with proper timeout configuration and
//! error handling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, MAX_CREATE_ATTEMPTS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::filename::disambiguate;
use crate::user_agent;

/// Browser User-Agent sent with the page request.
///
/// Galleries commonly serve a stripped page (or none) to unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36";

/// HTTP client shared by the page fetch, image downloads and the naming client.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// A file written by [`HttpClient::download_to_new_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Final filename (may differ from the requested one after a lost race).
    pub name: String,
    /// Full path of the written file.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Total timeout: 5 minutes
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Fetches a page and returns its body as text.
    ///
    /// Sends [`BROWSER_USER_AGENT`]. Redirects follow the client default.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` on network failure, timeout, or a non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<String, DownloadError> {
        let response = self.send_get(url, Some(BROWSER_USER_AGENT)).await?;
        let html = response
            .text()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;
        debug!(bytes = html.len(), "page fetched");
        Ok(html)
    }

    /// Downloads `url` into `dir/name`, never overwriting an existing file.
    ///
    /// The file is created exclusively. If `name` was claimed between the
    /// caller's existence check and this call, a timestamped variant is tried
    /// instead, up to a bounded number of attempts. A partially written file is
    /// removed when the transfer fails.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the request fails, the server returns a
    /// non-2xx status, no free name is found, or writing to disk fails.
    #[instrument(skip(self), fields(url = %url, dir = %dir.display()))]
    pub async fn download_to_new_file(
        &self,
        url: &str,
        dir: &Path,
        name: &str,
    ) -> Result<SavedFile, DownloadError> {
        let response = self.send_get(url, None).await?;
        let (name, path, mut file) = create_new_file(dir, name).await?;

        let written = match stream_to_file(&mut file, response, url, &path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e);
            }
        };

        info!(path = %path.display(), bytes = written, "image saved");
        Ok(SavedFile {
            name,
            path,
            bytes: written,
        })
    }

    async fn send_get(
        &self,
        url: &str,
        user_agent: Option<&str>,
    ) -> Result<reqwest::Response, DownloadError> {
        let parsed = url::Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_url(url));
        }

        let mut request = self.client.get(parsed);
        if let Some(ua) = user_agent {
            request = request.header(USER_AGENT, ua);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Creates `dir/name` exclusively, falling back to disambiguated names.
async fn create_new_file(dir: &Path, name: &str) -> Result<(String, PathBuf, File), DownloadError> {
    let mut candidate = name.to_string();
    for attempt in 1..=MAX_CREATE_ATTEMPTS {
        let path = dir.join(&candidate);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((candidate, path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), attempt, "name taken, picking another");
                candidate = disambiguate(name);
            }
            Err(e) => return Err(DownloadError::io(path, e)),
        }
    }
    Err(DownloadError::name_exhausted(name, MAX_CREATE_ATTEMPTS))
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::from_reqwest(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_fetch_page_sends_browser_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gallery"))
            .and(header("user-agent", BROWSER_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let html = client
            .fetch_page(&format!("{}/gallery", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(html, "<html></html>");
    }

    #[tokio::test]
    async fn test_fetch_page_404_is_http_status_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let result = client.fetch_page(&mock_server.uri()).await;
        assert!(matches!(
            result,
            Err(DownloadError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_connection_refused_is_network_error() {
        let client = HttpClient::new();
        let error = client.fetch_page("http://127.0.0.1:1/").await.unwrap_err();
        assert!(error.is_network(), "expected network error, got {error:?}");
    }

    #[tokio::test]
    async fn test_download_to_new_file_writes_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg bytes".to_vec()))
            .mount(&mock_server)
            .await;
        let temp_dir = TempDir::new().unwrap();

        let client = HttpClient::new();
        let saved = client
            .download_to_new_file(
                &format!("{}/a.jpg", mock_server.uri()),
                temp_dir.path(),
                "sunset.jpg",
            )
            .await
            .unwrap();

        assert_eq!(saved.name, "sunset.jpg");
        assert_eq!(saved.bytes, 10);
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_download_to_new_file_never_overwrites() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
            .mount(&mock_server)
            .await;
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("taken.png"), b"old").unwrap();

        let client = HttpClient::new();
        let saved = client
            .download_to_new_file(&mock_server.uri(), temp_dir.path(), "taken.png")
            .await
            .unwrap();

        assert_ne!(saved.name, "taken.png");
        assert!(saved.name.starts_with("taken-") && saved.name.ends_with(".png"));
        assert_eq!(std::fs::read(temp_dir.path().join("taken.png")).unwrap(), b"old");
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_download_to_new_file_error_status_creates_nothing() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        let temp_dir = TempDir::new().unwrap();

        let client = HttpClient::new();
        let result = client
            .download_to_new_file(&mock_server.uri(), temp_dir.path(), "x.jpg")
            .await;

        assert!(matches!(
            result,
            Err(DownloadError::HttpStatus { status: 500, .. })
        ));
        assert!(!temp_dir.path().join("x.jpg").exists());
    }

    #[tokio::test]
    async fn test_create_new_file_race_keeps_single_token() {
        let temp_dir = TempDir::new().unwrap();
        let taken = "sunset-20240501_134501_123456.jpg";
        std::fs::write(temp_dir.path().join(taken), b"winner").unwrap();

        let (name, path, _file) = create_new_file(temp_dir.path(), taken).await.unwrap();

        assert_ne!(name, taken);
        assert!(name.starts_with("sunset-") && name.ends_with(".jpg"), "name: {name}");
        assert_eq!(name.len(), taken.len(), "token stacked: {name}");
        assert_eq!(path, temp_dir.path().join(&name));
        assert_eq!(std::fs::read(temp_dir.path().join(taken)).unwrap(), b"winner");
    }
}
