//! DocumentAssembler.
//!
//! Wraps a rendered body with the title/source header and the document
//! separator:
//!
//! ```text
//!
//! ---
//!
//! # [<title>](<source_url>)
//!
//! <body>
//! ```

use scraper::Html;
use tracing::debug;

use kbscrape_crawler::dom::title_text;
use kbscrape_shared::{ExtractedDocument, KbScrapeError, Result};

/// Page title with the site-name suffix removed.
///
/// A missing `<title>`, or one that is empty once the suffix is gone, is a
/// page-level [`KbScrapeError::MissingTitle`].
pub fn derive_title(doc: &Html, suffix: &str, url: &str) -> Result<String> {
    let missing = || KbScrapeError::MissingTitle {
        url: url.to_string(),
    };

    let raw = title_text(doc).ok_or_else(missing)?;
    let title = raw.strip_suffix(suffix.trim()).unwrap_or(&raw).trim();
    if title.is_empty() {
        return Err(missing());
    }

    debug!(%title, "title derived");
    Ok(title.to_string())
}

/// Build the document for one page.
pub fn assemble(title: String, source_url: &str, body_markdown: String) -> ExtractedDocument {
    ExtractedDocument {
        title,
        source_url: source_url.to_string(),
        body_markdown,
    }
}

/// Serialize a document in the output format. Documents are concatenated
/// as-is; the leading separator keeps them apart.
pub fn render_document(doc: &ExtractedDocument) -> String {
    format!(
        "\n---\n\n# [{}]({})\n\n{}\n",
        doc.title,
        doc.source_url,
        doc.body_markdown.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUFFIX: &str = " | Prusa Knowledge Base";
    const URL: &str = "https://help.prusa3d.com/article/a_1";

    fn page(title: &str) -> Html {
        Html::parse_document(&format!(
            "<html><head><title>{title}</title></head><body></body></html>"
        ))
    }

    #[test]
    fn suffix_is_stripped() {
        let title = derive_title(&page("Cleaning the print sheet | Prusa Knowledge Base"), SUFFIX, URL);
        assert_eq!(title.unwrap(), "Cleaning the print sheet");
    }

    #[test]
    fn title_without_suffix_is_kept() {
        let title = derive_title(&page("Maintenance"), SUFFIX, URL);
        assert_eq!(title.unwrap(), "Maintenance");
    }

    #[test]
    fn missing_or_empty_title_is_an_error() {
        let no_title = Html::parse_document("<html><body><p>x</p></body></html>");
        assert!(matches!(
            derive_title(&no_title, SUFFIX, URL),
            Err(KbScrapeError::MissingTitle { .. })
        ));

        let only_suffix = derive_title(&page(" | Prusa Knowledge Base"), SUFFIX, URL);
        assert!(matches!(only_suffix, Err(KbScrapeError::MissingTitle { .. })));
    }

    #[test]
    fn document_format() {
        let doc = assemble("Title".into(), URL, "\n\nBody text.\n\n".into());
        assert_eq!(
            render_document(&doc),
            "\n---\n\n# [Title](https://help.prusa3d.com/article/a_1)\n\nBody text.\n"
        );
    }
}
