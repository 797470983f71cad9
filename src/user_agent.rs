//! Default User-Agent for image and naming requests.
//!
//! The page request overrides this with a browser User-Agent (see
//! [`crate::download::BROWSER_USER_AGENT`]); everything else identifies the tool.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/picture-downloader";

/// Default User-Agent identifying the tool and its version.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("picture-downloader/{version} (+{PROJECT_UA_URL})")
}
