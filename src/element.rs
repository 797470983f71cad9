//! Image elements matched on a page.
//!
//! The naming client and the download worker only need two things from an
//! element: attribute lookup and its serialized markup. [`ImageElement`]
//! captures that, so a parsed `scraper` element, an owned snapshot of one, and
//! a plain attribute map can be used interchangeably.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use scraper::ElementRef;

/// Attribute holding the lazily-loaded image URL; preferred over `src`.
pub const DATA_SRC_ATTR: &str = "data-src";

/// Standard image source attribute.
pub const SRC_ATTR: &str = "src";

/// Capability shared by every image element representation.
pub trait ImageElement {
    /// Returns the value of attribute `name`, if present.
    fn attr(&self, name: &str) -> Option<&str>;

    /// Returns the element serialized as HTML, used as naming context.
    fn markup(&self) -> String;

    /// Returns the image's source URL: `data-src` first, then `src`.
    ///
    /// Empty attribute values count as absent.
    fn source_url(&self) -> Option<&str> {
        [DATA_SRC_ATTR, SRC_ATTR]
            .into_iter()
            .filter_map(|name| self.attr(name))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

impl ImageElement for ElementRef<'_> {
    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn markup(&self) -> String {
        self.html()
    }
}

impl<S: std::hash::BuildHasher> ImageElement for HashMap<String, String, S> {
    fn attr(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }

    fn markup(&self) -> String {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort();
        render_img_tag(sorted.into_iter())
    }
}

/// Owned, thread-safe snapshot of a matched element.
///
/// `scraper` documents are not `Send`, so the coordinator snapshots every
/// match once after parsing and hands these to the worker tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTag {
    attributes: BTreeMap<String, String>,
    markup: String,
}

impl ImageTag {
    /// Creates a tag from attributes; markup is rendered as an `<img>` element.
    pub fn from_attributes<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let attributes: BTreeMap<String, String> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let markup = render_img_tag(attributes.iter());
        Self { attributes, markup }
    }

    /// Snapshots any element representation.
    pub fn from_element<E: ImageElement + ?Sized>(
        element: &E,
        attributes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            attributes,
            markup: element.markup(),
        }
    }

    /// Snapshots a parsed `scraper` element, keeping its original markup.
    #[must_use]
    pub fn from_scraped(element: &ElementRef<'_>) -> Self {
        let attributes = element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::from_element(element, attributes)
    }

    /// Returns all attributes in name order.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

impl ImageElement for ImageTag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn markup(&self) -> String {
        self.markup.clone()
    }
}

fn render_img_tag<'a>(attributes: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    let mut out = String::from("<img");
    for (name, value) in attributes {
        let escaped = value.replace('&', "&amp;").replace('"', "&quot;");
        let _ = write!(out, " {name}=\"{escaped}\"");
    }
    out.push('>');
    out
}
