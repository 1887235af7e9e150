//! Error types for kbscrape.
//!
//! Library crates use [`KbScrapeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all kbscrape operations.
#[derive(Debug, thiserror::Error)]
pub enum KbScrapeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("{url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The sitemap could not be parsed as a `<urlset>` document.
    #[error("sitemap parse error: {message}")]
    SitemapParse { message: String },

    /// Numeric ordering was requested but a URL carries no article ID.
    #[error("cannot order {url}: no numeric article id after an underscore")]
    UnorderableUrl { url: String },

    /// No article body could be located on a page.
    #[error("no content found on {url}")]
    NoContentFound { url: String },

    /// The page has no usable `<title>` element.
    #[error("missing <title> on {url}")]
    MissingTitle { url: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Filesystem or sink I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad flag value, empty allow-list, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KbScrapeError>;

impl KbScrapeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a sitemap parse error from any displayable message.
    pub fn sitemap(msg: impl Into<String>) -> Self {
        Self::SitemapParse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only affects a single page.
    ///
    /// Page-level errors are logged and the batch moves on; everything else
    /// aborts the run.
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::HttpStatus { .. }
                | Self::NoContentFound { .. }
                | Self::MissingTitle { .. }
                | Self::Conversion(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = KbScrapeError::config("unknown strategy");
        assert_eq!(err.to_string(), "config error: unknown strategy");

        let err = KbScrapeError::HttpStatus {
            url: "https://help.example.com/article/a_1".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "https://help.example.com/article/a_1: HTTP 404");
    }

    #[test]
    fn page_level_classification() {
        assert!(KbScrapeError::HttpStatus { url: "u".into(), status: 500 }.is_page_level());
        assert!(KbScrapeError::NoContentFound { url: "u".into() }.is_page_level());
        assert!(KbScrapeError::MissingTitle { url: "u".into() }.is_page_level());
        assert!(!KbScrapeError::sitemap("truncated").is_page_level());
        assert!(!KbScrapeError::UnorderableUrl { url: "u".into() }.is_page_level());
    }
}
