//! URL helpers for image sources.
//!
//! Image sources scraped from a page are frequently relative
//! (`/img/a.png`, `//cdn.example.com/a.png`, `a.png`), so they are resolved
//! against the page URL before fetching. The last path segment of the source
//! doubles as the fallback filename when no descriptive name is available.

use thiserror::Error;
use url::Url;

use crate::download::timestamp_token;

/// Errors from URL resolution.
#[derive(Debug, Error)]
pub enum UrlError {
    /// The base URL could not be parsed as an absolute URL.
    #[error("invalid base URL {url}: {source}")]
    InvalidBase {
        /// The rejected base URL.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The reference could not be joined onto the base URL.
    #[error("cannot resolve {reference} against {base}: {source}")]
    Unresolvable {
        /// The base URL.
        base: String,
        /// The reference that failed to resolve.
        reference: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Returns the last path segment of `url`, ignoring query string and fragment.
///
/// The segment is returned verbatim (no percent-decoding). Inputs that are not
/// absolute URLs are treated as bare paths. When the path has no final segment
/// (`https://example.com/`), a generated `image-<timestamp>.bin` name is
/// returned instead.
///
/// # Example
///
/// ```
/// use picture_downloader_core::urls::extract_filename;
///
/// let name = extract_filename("https://img.example.com/community/foo.png?x=1/y.webp");
/// assert_eq!(name, "foo.png");
/// ```
#[must_use]
pub fn extract_filename(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or_default();
            path.rsplit('/').next().map(str::to_string)
        }
    };

    match segment {
        Some(name) if !name.is_empty() => name,
        _ => format!("image-{}.bin", timestamp_token()),
    }
}

/// Resolves `maybe_relative` against `base` per RFC 3986.
///
/// Already-absolute inputs are returned unchanged, byte for byte.
///
/// # Errors
///
/// Returns [`UrlError::InvalidBase`] if `base` is not an absolute URL, or
/// [`UrlError::Unresolvable`] if the join fails.
pub fn resolve_url(base: &str, maybe_relative: &str) -> Result<String, UrlError> {
    if Url::parse(maybe_relative).is_ok() {
        return Ok(maybe_relative.to_string());
    }

    let base_url = Url::parse(base).map_err(|source| UrlError::InvalidBase {
        url: base.to_string(),
        source,
    })?;

    base_url
        .join(maybe_relative)
        .map(String::from)
        .map_err(|source| UrlError::Unresolvable {
            base: base.to_string(),
            reference: maybe_relative.to_string(),
            source,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_filename_ignores_query_string() {
        let url = "https://img.zcool.cn/community/01vttarjy7ow5sdayn6tah3731.jpg?imageMogr2/auto-orient/thumbnail/1280x%3e/sharpen/0.5/quality/100/format/webp";
        assert_eq!(extract_filename(url), "01vttarjy7ow5sdayn6tah3731.jpg");
    }

    #[test]
    fn test_extract_filename_simple_path() {
        assert_eq!(
            extract_filename("https://img.zcool.cn/community/foo.png"),
            "foo.png"
        );
    }

    #[test]
    fn test_extract_filename_keeps_percent_encoding() {
        assert_eq!(
            extract_filename("https://example.com/a/my%20photo.jpg"),
            "my%20photo.jpg"
        );
    }

    #[test]
    fn test_extract_filename_relative_path() {
        assert_eq!(extract_filename("/img/httpx-help.png?v=2"), "httpx-help.png");
        assert_eq!(extract_filename("cat.gif#top"), "cat.gif");
    }

    #[test]
    fn test_extract_filename_empty_segment_generates_name() {
        let name = extract_filename("https://example.com/");
        assert!(name.starts_with("image-"), "unexpected fallback: {name}");
        assert!(name.ends_with(".bin"), "unexpected fallback: {name}");
    }

    #[test]
    fn test_extract_filename_is_idempotent() {
        for url in [
            "https://example.com/a/b/sunset.jpg?w=100",
            "https://example.com/photo.webp",
            "//cdn.example.com/x/y/z.png",
            "relative/dir/image.gif",
        ] {
            let once = extract_filename(url);
            assert_eq!(extract_filename(&once), once, "not idempotent for {url}");
        }
    }

    #[test]
    fn test_resolve_url_absolute_unchanged() {
        let absolute = "https://cdn.example.com/Images/A.PNG?x=1";
        assert_eq!(
            resolve_url("https://example.com/gallery/", absolute).unwrap(),
            absolute
        );
    }

    #[test]
    fn test_resolve_url_relative_path() {
        assert_eq!(
            resolve_url("https://example.com/gallery/index.html", "img/a.png").unwrap(),
            "https://example.com/gallery/img/a.png"
        );
    }

    #[test]
    fn test_resolve_url_root_relative() {
        assert_eq!(
            resolve_url("https://example.com/gallery/index.html", "/static/a.png").unwrap(),
            "https://example.com/static/a.png"
        );
    }

    #[test]
    fn test_resolve_url_protocol_relative() {
        assert_eq!(
            resolve_url("https://example.com/gallery/", "//cdn.example.com/a.png").unwrap(),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_resolve_url_parent_segments() {
        assert_eq!(
            resolve_url("https://example.com/a/b/c.html", "../d.png").unwrap(),
            "https://example.com/a/d.png"
        );
    }

    #[test]
    fn test_resolve_url_invalid_base() {
        let result = resolve_url("not a url", "a.png");
        assert!(matches!(result, Err(UrlError::InvalidBase { .. })));
    }
}
