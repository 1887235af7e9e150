//! Core domain types shared by the scraping pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KbScrapeError;

// ---------------------------------------------------------------------------
// FetchedPage
// ---------------------------------------------------------------------------

/// A page as returned by the fetcher, before any DOM processing.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The requested article URL.
    pub url: String,
    /// Response body decoded as text.
    pub raw_html: String,
    /// HTTP status code.
    pub status: u16,
}

impl FetchedPage {
    /// Whether the page may enter the extraction stages.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

// ---------------------------------------------------------------------------
// ExtractedDocument
// ---------------------------------------------------------------------------

/// A fully processed page, ready to be written to the output sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Page title with the site suffix removed.
    pub title: String,
    /// The article URL the document was built from.
    pub source_url: String,
    /// Normalized Markdown body.
    pub body_markdown: String,
}

// ---------------------------------------------------------------------------
// LocatorStrategy
// ---------------------------------------------------------------------------

/// Which content-location strategy a deployment uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorStrategy {
    /// Pick the element that directly parents the most `<p>` tags.
    #[default]
    Density,
    /// Run a Readability extractor over the whole stripped document.
    Readability,
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Density => write!(f, "density"),
            Self::Readability => write!(f, "readability"),
        }
    }
}

impl FromStr for LocatorStrategy {
    type Err = KbScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "density" => Ok(Self::Density),
            "readability" => Ok(Self::Readability),
            other => Err(KbScrapeError::config(format!(
                "unknown locator strategy '{other}': expected 'density' or 'readability'"
            ))),
        }
    }
}
