//! Descriptive image naming via a streaming text-generation endpoint.
//!
//! The worker depends on the [`ImageNamer`] trait, not on the endpoint:
//! [`NamingClient`] talks to the endpoint, [`UrlNamer`] is used when naming is
//! disabled and always defers to the URL-derived fallback name.
//!
//! # Example
//!
//! ```no_run
//! use picture_downloader_core::download::HttpClient;
//! use picture_downloader_core::element::ImageTag;
//! use picture_downloader_core::naming::{ImageNamer, NamingClient};
//! use picture_downloader_core::settings::NamingSettings;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = NamingSettings::from_env(None)?;
//! let namer = NamingClient::new(&HttpClient::new(), settings);
//! let tag = ImageTag::from_attributes([("src", "https://example.com/01vtt.jpg"), ("alt", "duck by a pond")]);
//! let name = namer.name_image(&tag, "01vtt.jpg").await.unwrap_or_else(|| "01vtt.jpg".into());
//! println!("{name}");
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::element::ImageTag;

mod client;
mod error;
mod prompt;
mod stream;

pub use client::NamingClient;
pub use error::NamingError;
pub use prompt::{NAMING_INSTRUCTION, build_prompt};

/// Produces a descriptive filename for an image element.
#[async_trait]
pub trait ImageNamer: Send + Sync {
    /// Returns a name for `element`, or `None` to use `fallback_name`.
    async fn name_image(&self, element: &ImageTag, fallback_name: &str) -> Option<String>;
}

/// Namer used when naming is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlNamer;

#[async_trait]
impl ImageNamer for UrlNamer {
    async fn name_image(&self, _element: &ImageTag, _fallback_name: &str) -> Option<String> {
        None
    }
}
