//! Readability locator backed by `dom_smoothie`.
//!
//! Runs over the whole stripped document, which suits guide pages whose text
//! sits in `<span>`/`<div>` blocks rather than paragraphs.

use dom_smoothie::Readability;
use kbscrape_shared::{KbScrapeError, Result};
use scraper::Html;
use tracing::debug;

use super::ContentLocator;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadabilityLocator;

impl ContentLocator for ReadabilityLocator {
    fn locate(&self, doc: &Html, url: &str) -> Result<String> {
        let no_content = |reason: String| {
            debug!(%url, %reason, "readability found no article");
            KbScrapeError::NoContentFound {
                url: url.to_string(),
            }
        };

        let mut reader = Readability::new(doc.html(), Some(url), None)
            .map_err(|e| no_content(e.to_string()))?;
        let article = reader.parse().map_err(|e| no_content(e.to_string()))?;

        let content = article.content.to_string();
        if content.trim().is_empty() {
            return Err(no_content("empty article".into()));
        }
        Ok(content)
    }

    fn name(&self) -> &str {
        "readability"
    }
}
