//! Link extraction.
//!
//! Walks every page of a PDF in document order and collects:
//! - the URI of every clickable link annotation
//! - every `http://` / `https://` URL found in the page's plain text
//!
//! Both sources are unioned into one [`ExtractedLinks`] set keyed by exact
//! string equality. No normalization is applied.
//!
//! # Examples
//!
//! ```no_run
//! use linkcat::extract::extract_links;
//!
//! # fn example(bytes: &[u8]) -> linkcat::Result<()> {
//! let links = extract_links(bytes)?;
//! for url in links.iter() {
//!     println!("{url}");
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pdf::{LopdfDocument, PdfDocument};

/// `http://` or `https://` followed by anything up to whitespace, `<`, `>`,
/// `)` or `]`.
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s<>\)\]]+").unwrap());

/// Where a link was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    /// Clickable `/Link` annotation.
    Annotation,
    /// URL matched in the page text.
    Text,
}

impl fmt::Display for LinkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annotation => write!(f, "link annotation"),
            Self::Text => write!(f, "URL in text"),
        }
    }
}

/// The unique URLs found in a document.
///
/// Iteration is lexicographic. That order is what the fetcher traverses, but
/// it carries no meaning about where links appear in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractedLinks(BTreeSet<String>);

impl ExtractedLinks {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a URL. Returns false if it was already present.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.0.insert(url.into())
    }

    /// Whether the URL is present (exact match).
    pub fn contains(&self, url: &str) -> bool {
        self.0.contains(url)
    }

    /// Number of unique URLs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no link was found.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Copy the URLs out as a list, in traversal order.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ExtractedLinks {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for ExtractedLinks {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Find every URL in a block of text.
pub fn find_text_urls(text: &str) -> impl Iterator<Item = &str> {
    RE_URL.find_iter(text).map(|m| m.as_str())
}

/// Extracts links from PDF documents.
#[derive(Debug, Clone, Default)]
pub struct LinkExtractor;

impl LinkExtractor {
    /// Create a new link extractor.
    pub fn new() -> Self {
        Self
    }

    /// Parse `bytes` as a PDF and extract its links.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LinkCatError::MalformedDocument`] if the bytes are not
    /// a parseable PDF.
    pub fn extract(&self, bytes: &[u8], source_name: &str) -> Result<ExtractedLinks> {
        let doc = LopdfDocument::load_mem(bytes, source_name)?;
        self.extract_from(&doc)
    }

    /// Extract links from any [`PdfDocument`].
    ///
    /// A page whose annotations or text cannot be read is logged and skipped;
    /// it does not abort extraction.
    pub fn extract_from(&self, doc: &dyn PdfDocument) -> Result<ExtractedLinks> {
        let mut links = ExtractedLinks::new();
        let page_count = doc.page_count() as u32;

        for page in 1..=page_count {
            match doc.page_link_annotations(page) {
                Ok(uris) => {
                    for uri in uris {
                        record(&mut links, page, LinkSource::Annotation, uri);
                    }
                }
                Err(e) => warn!(page, error = %e, "Cannot read link annotations"),
            }

            match doc.page_text(page) {
                Ok(text) => {
                    for url in find_text_urls(&text) {
                        record(&mut links, page, LinkSource::Text, url);
                    }
                }
                Err(e) => warn!(page, error = %e, "Cannot extract page text"),
            }
        }

        info!(total = links.len(), "Total unique links extracted");
        Ok(links)
    }
}

fn record(links: &mut ExtractedLinks, page: u32, source: LinkSource, url: impl Into<String>) {
    let url = url.into();
    debug!(page, %source, %url, "Found link");
    links.insert(url);
}

/// Parse `document` and return the set of unique URLs it contains.
///
/// Convenience function for [`LinkExtractor::extract`] on an upload.
pub fn extract_links(document: &[u8]) -> Result<ExtractedLinks> {
    LinkExtractor::new().extract(document, "upload")
}
