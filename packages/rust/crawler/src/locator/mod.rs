//! ContentLocator strategies.
//!
//! A locator receives the stripped document and returns the HTML fragment of
//! the article body. The strategy is chosen once per run from configuration;
//! strategies are never combined on a page.

mod density;
mod readability;

use kbscrape_shared::{LocatorStrategy, Result};
use scraper::Html;

pub use density::{ContentCandidate, DensityLocator, best_candidate, score_candidates};
pub use readability::ReadabilityLocator;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Finds the article body inside a stripped page.
pub trait ContentLocator: Send + Sync {
    /// Return the body as an HTML fragment, or
    /// [`kbscrape_shared::KbScrapeError::NoContentFound`].
    fn locate(&self, doc: &Html, url: &str) -> Result<String>;

    /// Human-readable strategy name for tracing.
    fn name(&self) -> &str;
}

/// Build the locator for a configured strategy.
pub fn for_strategy(strategy: LocatorStrategy) -> Box<dyn ContentLocator> {
    match strategy {
        LocatorStrategy::Density => Box::new(DensityLocator),
        LocatorStrategy::Readability => Box::new(ReadabilityLocator),
    }
}
