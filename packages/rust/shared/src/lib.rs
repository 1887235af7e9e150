//! Shared types, error model, and configuration for kbscrape.
//!
//! This crate is the foundation depended on by all other kbscrape crates.
//! It provides:
//! - [`KbScrapeError`]: the unified error type
//! - Domain types ([`FetchedPage`], [`ExtractedDocument`], [`LocatorStrategy`])
//! - Configuration ([`AppConfig`], [`ScrapeConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, PolitenessConfig, ScrapeConfig, SiteConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{KbScrapeError, Result};
pub use types::{ExtractedDocument, FetchedPage, LocatorStrategy};
