//! Page fetching and HTML extraction for kbscrape.
//!
//! This crate provides:
//! - [`engine`]: [`PageFetcher`], the HTTP client with the site's header set
//! - [`boilerplate`]: [`BoilerplateStripper`], the ordered chrome-removal passes
//! - [`locator`]: [`ContentLocator`] strategies that find the article body
//! - [`dom`]: small `scraper` helpers shared by the above

pub mod boilerplate;
pub mod dom;
pub mod engine;
pub mod locator;

pub use boilerplate::{
    BoilerplateStripper, MarkerRule, MatchPolicy, Optionality, StripPass, StripReport, TagKind,
};
pub use engine::PageFetcher;
pub use locator::{ContentLocator, DensityLocator, ReadabilityLocator, for_strategy};
