//! Sitemap discovery for kbscrape.
//!
//! Fetches the site's sitemap, parses its `<url>` entries with their hreflang
//! alternates and reduces them to the batch of article URLs to process.
//! Every failure here is fatal to the run.

mod catalog;
mod parser;

use kbscrape_shared::{KbScrapeError, Result, ScrapeConfig};
use reqwest::Client;
use tracing::{info, instrument};

pub use catalog::{CatalogQuery, Rejection, UrlBatch, article_id, build_batch, select_url};
pub use parser::{Alternate, SitemapEntry, parse_sitemap};

/// Maximum sitemap size we accept (50 MB, the sitemap protocol ceiling).
const MAX_SITEMAP_SIZE: u64 = 50 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Fetch, parse and filter the sitemap configured in `config`.
#[instrument(skip_all, fields(sitemap = %config.site.sitemap_url, lang = %config.language))]
pub async fn discover(client: &Client, config: &ScrapeConfig) -> Result<UrlBatch> {
    let xml = fetch_sitemap(client, &config.site.sitemap_url).await?;
    let entries = parse_sitemap(&xml)?;
    let batch = build_batch(&entries, &CatalogQuery::from(config))?;

    info!(
        entries = entries.len(),
        selected = batch.urls.len(),
        rejected_language = batch.rejected_language,
        rejected_type = batch.rejected_type,
        duplicates = batch.duplicates,
        "sitemap catalogued"
    );

    Ok(batch)
}

/// GET the sitemap body. Non-success statuses are errors.
pub async fn fetch_sitemap(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| KbScrapeError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(KbScrapeError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if let Some(len) = response.content_length() {
        if len > MAX_SITEMAP_SIZE {
            return Err(KbScrapeError::validation(format!(
                "{url}: sitemap too large ({len} bytes, max {MAX_SITEMAP_SIZE})"
            )));
        }
    }

    response
        .text()
        .await
        .map_err(|e| KbScrapeError::Network(format!("{url}: failed to read body: {e}")))
}
