//! UrlCatalog: turns parsed sitemap entries into the batch of article URLs.
//!
//! Per entry the last alternate in the target language wins. The URL is kept
//! only if the path after the site prefix starts with an allowed content type.
//! The batch is then deduplicated, optionally ordered by article ID, and
//! truncated to the limit.

use std::collections::HashSet;
use std::sync::LazyLock;

use kbscrape_shared::{KbScrapeError, Result, ScrapeConfig};
use regex::Regex;
use tracing::debug;

use crate::parser::SitemapEntry;

/// Numeric article ID after the final underscore, e.g. `foo-bar_2031`.
static ARTICLE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d+)/?$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Query & results
// ---------------------------------------------------------------------------

/// Selection parameters for one batch.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    /// Target hreflang tag.
    pub language: String,
    /// Allowed path prefixes after the site prefix.
    pub content_types: Vec<String>,
    /// Site base URL; only its length is used when filtering.
    pub site_prefix: String,
    /// Sort by numeric article ID before truncating.
    pub order_by_id: bool,
    /// Maximum batch length.
    pub limit: usize,
}

impl From<&ScrapeConfig> for CatalogQuery {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            language: config.language.clone(),
            content_types: config
                .content_types
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            site_prefix: config.site.base_url.clone(),
            order_by_id: config.order_by_id,
            limit: config.limit,
        }
    }
}

/// Why a sitemap entry produced no URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("no alternate in language '{0}'")]
    NoLanguageMatch(String),

    #[error("content type not allowed: {0}")]
    ContentTypeNotAllowed(String),
}

/// The selected URLs plus bookkeeping for the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlBatch {
    /// Article URLs in processing order.
    pub urls: Vec<String>,
    /// Entries with no alternate in the target language.
    pub rejected_language: usize,
    /// Entries whose URL is outside the allow-list.
    pub rejected_type: usize,
    /// URLs dropped as repeats.
    pub duplicates: usize,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Pick the URL an entry contributes to the batch, if any.
pub fn select_url(entry: &SitemapEntry, query: &CatalogQuery) -> std::result::Result<String, Rejection> {
    let href = entry
        .alternates
        .iter()
        .rev()
        .find(|alt| alt.hreflang == query.language)
        .map(|alt| alt.href.clone())
        .ok_or_else(|| Rejection::NoLanguageMatch(query.language.clone()))?;

    if is_allowed_type(&href, query) {
        Ok(href)
    } else {
        Err(Rejection::ContentTypeNotAllowed(href))
    }
}

/// Prefix test on the remainder after the fixed-length site prefix.
fn is_allowed_type(url: &str, query: &CatalogQuery) -> bool {
    let Some(rest) = url.get(query.site_prefix.len()..) else {
        return false;
    };
    query
        .content_types
        .iter()
        .any(|t| rest.starts_with(t.as_str()))
}

/// Numeric article ID embedded at the end of a URL.
pub fn article_id(url: &str) -> Option<u64> {
    ARTICLE_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Build the batch from parsed entries.
///
/// Returns [`KbScrapeError::UnorderableUrl`] when ordering is requested and a
/// selected URL carries no article ID.
pub fn build_batch(entries: &[SitemapEntry], query: &CatalogQuery) -> Result<UrlBatch> {
    let mut batch = UrlBatch::default();
    let mut seen = HashSet::new();

    for entry in entries {
        match select_url(entry, query) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    batch.urls.push(url);
                } else {
                    batch.duplicates += 1;
                }
            }
            Err(reason) => {
                debug!(loc = ?entry.loc, %reason, "sitemap entry skipped");
                match reason {
                    Rejection::NoLanguageMatch(_) => batch.rejected_language += 1,
                    Rejection::ContentTypeNotAllowed(_) => batch.rejected_type += 1,
                }
            }
        }
    }

    if query.order_by_id {
        let mut keyed = Vec::with_capacity(batch.urls.len());
        for url in batch.urls.drain(..) {
            let id = article_id(&url).ok_or_else(|| KbScrapeError::UnorderableUrl {
                url: url.clone(),
            })?;
            keyed.push((id, url));
        }
        keyed.sort_by_key(|(id, _)| *id);
        batch.urls = keyed.into_iter().map(|(_, url)| url).collect();
    }

    batch.urls.truncate(query.limit);
    Ok(batch)
}
