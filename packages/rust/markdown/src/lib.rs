//! MarkdownRenderer: HTML fragment to normalized Markdown.
//!
//! Converts the located article body with the `htmd` crate, then applies the
//! normalization passes in [`cleanup`]: rule lines, bullet glyphs, per-line
//! trimming, blank-line collapsing, an optional canonicalizing pass and the
//! removal of leftover page-chrome labels.

mod cleanup;

use kbscrape_shared::{KbScrapeError, Result};
use scraper::node::Text;
use scraper::{ElementRef, Html, Node};
use tracing::{debug, instrument};
use url::Url;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for one rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Keep images as `![alt](src)`; otherwise each image becomes its alt text.
    pub include_images: bool,
    /// Run the canonicalizing pass (heading demotion, heading spacing,
    /// leftover-tag stripping, fence-language cleanup, link resolution).
    pub canonicalize: bool,
    /// Base for resolving relative links when canonicalizing.
    pub base_url: Option<Url>,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Render an HTML fragment to Markdown.
///
/// Lines are never wrapped and tables are not rebuilt; their cell text flows
/// through as plain text.
#[instrument(skip_all, fields(images = opts.include_images, canonicalize = opts.canonicalize))]
pub fn render(html: &str, opts: &RenderOptions) -> Result<String> {
    let html = if opts.include_images {
        html.to_string()
    } else {
        images_to_alt_text(html)
    };

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "iframe", "noscript", "svg"])
        .build();

    let raw_markdown = converter
        .convert(&html)
        .map_err(|e| KbScrapeError::Conversion(format!("htmd conversion failed: {e}")))?;

    debug!(raw_len = raw_markdown.len(), "htmd conversion complete");

    let markdown = cleanup::run_pipeline(&raw_markdown, opts.canonicalize, opts.base_url.as_ref());

    debug!(final_len = markdown.len(), "markdown normalized");
    Ok(markdown)
}

// ---------------------------------------------------------------------------
// Image pre-processing
// ---------------------------------------------------------------------------

/// Replace every `<img>` by a text node holding its alt text.
fn images_to_alt_text(html: &str) -> String {
    let mut doc = Html::parse_fragment(html);

    let images: Vec<_> = doc
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "img")
        .map(|el| (el.id(), el.value().attr("alt").unwrap_or_default().to_string()))
        .collect();

    if images.is_empty() {
        return html.to_string();
    }

    for (id, alt) in images {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.insert_before(Node::Text(Text {
                text: alt.as_str().into(),
            }));
            node.detach();
        }
    }

    doc.root_element().inner_html()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
