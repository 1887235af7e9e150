//! Application configuration for kbscrape.
//!
//! User config lives at `~/.kbscrape/kbscrape.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{KbScrapeError, Result};
use crate::types::LocatorStrategy;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "kbscrape.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".kbscrape";

// ---------------------------------------------------------------------------
// Config structs (matching kbscrape.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// The knowledge-base site being scraped.
    #[serde(default)]
    pub site: SiteConfig,

    /// Default extraction settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Request pacing.
    #[serde(default)]
    pub politeness: PolitenessConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site root; its length is the prefix stripped before content-type matching.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Location of the sitemap with hreflang alternates.
    #[serde(default = "default_sitemap_url")]
    pub sitemap_url: String,

    /// Suffix removed from every `<title>`.
    #[serde(default = "default_title_suffix")]
    pub title_suffix: String,

    /// `User-Agent` header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// `Accept` header.
    #[serde(default = "default_accept")]
    pub accept: String,

    /// `Accept-Language` header.
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// `Referer` header.
    #[serde(default = "default_referer")]
    pub referer: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            sitemap_url: default_sitemap_url(),
            title_suffix: default_title_suffix(),
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            referer: default_referer(),
        }
    }
}

fn default_base_url() -> String {
    "https://help.prusa3d.com/".into()
}
fn default_sitemap_url() -> String {
    "https://help.prusa3d.com/sitemap.xml".into()
}
fn default_title_suffix() -> String {
    " | Prusa Knowledge Base".into()
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64; rv:122.0) Gecko/20100101 Firefox/122.0".into()
}
fn default_accept() -> String {
    "*/*".into()
}
fn default_accept_language() -> String {
    "en-US,en;q=0.5".into()
}
fn default_referer() -> String {
    "https://help.prusa3d.com/".into()
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// hreflang tag used to pick one alternate per sitemap entry.
    #[serde(default = "default_language")]
    pub language: String,

    /// Maximum number of pages to process.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Allowed URL path prefixes after the site root.
    #[serde(default = "default_content_types")]
    pub content_types: Vec<String>,

    /// Content-location strategy.
    #[serde(default)]
    pub strategy: LocatorStrategy,

    /// Keep images inline instead of reducing them to alt text.
    #[serde(default)]
    pub images: bool,

    /// Sort the batch by the numeric article ID before truncating.
    #[serde(default)]
    pub order_by_id: bool,

    /// Run the canonicalizing Markdown pass (heading demotion, heading
    /// spacing, leftover-tag stripping, link resolution).
    #[serde(default)]
    pub canonicalize: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            limit: default_limit(),
            content_types: default_content_types(),
            strategy: LocatorStrategy::default(),
            images: false,
            order_by_id: false,
            canonicalize: false,
        }
    }
}

fn default_language() -> String {
    "en".into()
}
fn default_limit() -> usize {
    10
}
fn default_content_types() -> Vec<String> {
    // Guides mostly repeat article content.
    vec!["article".into()]
}

/// `[politeness]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolitenessConfig {
    /// Maximum in-flight page requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause before each page request, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            delay_ms: 0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}
fn default_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Scrape config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime scrape configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Site profile.
    pub site: SiteConfig,
    /// Target hreflang tag.
    pub language: String,
    /// Allowed URL path prefixes.
    pub content_types: Vec<String>,
    /// Maximum number of pages to process.
    pub limit: usize,
    /// Sort by numeric article ID before truncating.
    pub order_by_id: bool,
    /// Keep images inline.
    pub include_images: bool,
    /// Run the canonicalizing Markdown pass.
    pub canonicalize: bool,
    /// Reserved whitespace-compression switch. Has no effect on output.
    pub compress: bool,
    /// Content-location strategy.
    pub strategy: LocatorStrategy,
    /// Maximum in-flight page requests.
    pub concurrency: usize,
    /// Pause before each page request, in milliseconds.
    pub delay_ms: u64,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl From<&AppConfig> for ScrapeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            site: config.site.clone(),
            language: config.defaults.language.clone(),
            content_types: config.defaults.content_types.clone(),
            limit: config.defaults.limit,
            order_by_id: config.defaults.order_by_id,
            include_images: config.defaults.images,
            canonicalize: config.defaults.canonicalize,
            compress: false,
            strategy: config.defaults.strategy,
            concurrency: config.politeness.concurrency,
            delay_ms: config.politeness.delay_ms,
            timeout_secs: config.politeness.timeout_secs,
        }
    }
}

impl ScrapeConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.site.base_url).map_err(|e| {
            KbScrapeError::config(format!("invalid site base_url '{}': {e}", self.site.base_url))
        })?;
        Url::parse(&self.site.sitemap_url).map_err(|e| {
            KbScrapeError::config(format!(
                "invalid site sitemap_url '{}': {e}",
                self.site.sitemap_url
            ))
        })?;
        if self.language.trim().is_empty() {
            return Err(KbScrapeError::validation("language tag must not be empty"));
        }
        if self.content_types.iter().all(|t| t.trim().is_empty()) {
            return Err(KbScrapeError::validation(
                "content type allow-list must contain at least one prefix",
            ));
        }
        if self.concurrency == 0 {
            return Err(KbScrapeError::validation("concurrency must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.kbscrape/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| KbScrapeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.kbscrape/kbscrape.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| KbScrapeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        KbScrapeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| KbScrapeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| KbScrapeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| KbScrapeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("sitemap_url"));
        assert!(toml_str.contains("strategy = \"density\""));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r#"
[defaults]
language = "cs"
content_types = ["article", "guide"]
strategy = "readability"

[politeness]
concurrency = 2
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.language, "cs");
        assert_eq!(config.defaults.content_types, vec!["article", "guide"]);
        assert_eq!(config.defaults.strategy, LocatorStrategy::Readability);
        assert_eq!(config.defaults.limit, 10);
        assert_eq!(config.politeness.concurrency, 2);
        assert_eq!(config.site.base_url, "https://help.prusa3d.com/");
    }

    #[test]
    fn default_prefix_is_site_root() {
        let site = SiteConfig::default();
        assert_eq!(site.base_url.len(), 25);
        assert!(site.sitemap_url.starts_with(&site.base_url));
    }

    #[test]
    fn scrape_config_from_app_config() {
        let app = AppConfig::default();
        let scrape = ScrapeConfig::from(&app);
        assert_eq!(scrape.language, "en");
        assert_eq!(scrape.limit, 10);
        assert_eq!(scrape.content_types, vec!["article"]);
        assert!(!scrape.include_images);
        assert!(!scrape.compress);
        assert_eq!(scrape.concurrency, 4);
        assert!(scrape.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_settings() {
        let app = AppConfig::default();

        let mut zero = ScrapeConfig::from(&app);
        zero.concurrency = 0;
        assert!(zero.validate().is_err());

        let mut empty_types = ScrapeConfig::from(&app);
        empty_types.content_types = vec![" ".into()];
        assert!(empty_types.validate().is_err());

        let mut bad_url = ScrapeConfig::from(&app);
        bad_url.site.base_url = "not a url".into();
        assert!(bad_url.validate().is_err());
    }
}
