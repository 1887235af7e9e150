//! PageFetcher: HTTP GET of article pages with the site's fixed header set.
//!
//! Non-success statuses are returned as data so the pipeline can log and skip
//! the page. Transport failures surface as [`KbScrapeError::Network`], which is
//! page-level as well.

use std::time::Duration;

use kbscrape_shared::{FetchedPage, KbScrapeError, Result, SiteConfig};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, DNT, HeaderMap, HeaderName, HeaderValue, REFERER};
use tracing::{debug, instrument};

/// Maximum number of redirects to follow per page.
const MAX_REDIRECTS: usize = 5;

/// Fetch-metadata headers the site expects from a browser.
const SEC_FETCH_HEADERS: [(&str, &str); 3] = [
    ("sec-fetch-dest", "script"),
    ("sec-fetch-mode", "no-cors"),
    ("sec-fetch-site", "same-site"),
];

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

/// Shared HTTP client configured for one site.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Build a fetcher sending the headers of `site` on every request.
    pub fn new(site: &SiteConfig, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(site.user_agent.as_str())
            .default_headers(default_headers(site)?)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| KbScrapeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// The underlying client, for requests outside page fetching (the sitemap).
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET one page.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| KbScrapeError::Network(format!("{url}: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            debug!(status, "non-success status");
            return Ok(FetchedPage {
                url: url.to_string(),
                raw_html: String::new(),
                status,
            });
        }

        let raw_html = response
            .text()
            .await
            .map_err(|e| KbScrapeError::Network(format!("{url}: body read failed: {e}")))?;

        debug!(bytes = raw_html.len(), "page fetched");
        Ok(FetchedPage {
            url: url.to_string(),
            raw_html,
            status,
        })
    }
}

/// Header set sent with every page request.
fn default_headers(site: &SiteConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, header_value("accept", &site.accept)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("accept_language", &site.accept_language)?,
    );
    headers.insert(REFERER, header_value("referer", &site.referer)?);
    headers.insert(DNT, HeaderValue::from_static("1"));
    for (name, value) in SEC_FETCH_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    Ok(headers)
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| KbScrapeError::config(format!("invalid site {field} header '{value}': {e}")))
}
