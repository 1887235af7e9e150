//! Sitemap XML parser.
//!
//! Reads a `<urlset>` document where every `<url>` carries a `<loc>` and any
//! number of `<xhtml:link rel="alternate" hreflang=".." href=".."/>` children:
//!
//! ```xml
//! <urlset xmlns:xhtml="http://www.w3.org/1999/xhtml">
//!   <url>
//!     <loc>https://help.example.com/article/foo_12</loc>
//!     <xhtml:link rel="alternate" hreflang="en" href="https://help.example.com/article/foo_12"/>
//!   </url>
//! </urlset>
//! ```

use kbscrape_shared::{KbScrapeError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One `<url>` element of the sitemap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapEntry {
    /// The canonical `<loc>` value, if present.
    pub loc: Option<String>,
    /// Language alternates in document order.
    pub alternates: Vec<Alternate>,
}

/// A language-tagged variant URL of the same logical page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternate {
    /// The `hreflang` attribute.
    pub hreflang: String,
    /// The `href` attribute.
    pub href: String,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse sitemap XML into entries.
///
/// Mismatched or unclosed tags and documents without a `<urlset>` element are
/// reported as [`KbScrapeError::SitemapParse`].
pub fn parse_sitemap(xml: &str) -> Result<Vec<SitemapEntry>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut current: Option<SitemapEntry> = None;
    let mut in_loc = false;
    let mut saw_urlset = false;
    let mut open_elements: usize = 0;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            KbScrapeError::sitemap(format!("at byte {}: {e}", reader.buffer_position()))
        })?;

        match event {
            Event::Start(e) => {
                open_elements += 1;
                match e.local_name().as_ref() {
                    b"urlset" => saw_urlset = true,
                    b"url" => current = Some(SitemapEntry::default()),
                    b"loc" if current.is_some() => in_loc = true,
                    b"link" => push_alternate(&mut current, &e)?,
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"link" {
                    push_alternate(&mut current, &e)?;
                }
            }
            Event::Text(e) if in_loc => {
                let text = e
                    .unescape()
                    .map_err(|e| KbScrapeError::sitemap(format!("bad <loc> text: {e}")))?;
                if let Some(entry) = current.as_mut() {
                    let loc = entry.loc.get_or_insert_with(String::new);
                    loc.push_str(text.trim());
                }
            }
            Event::End(e) => {
                open_elements = open_elements.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"loc" => in_loc = false,
                    b"url" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if open_elements != 0 {
        return Err(KbScrapeError::sitemap(format!(
            "document ended with {open_elements} unclosed element(s)"
        )));
    }
    if !saw_urlset {
        return Err(KbScrapeError::sitemap("no <urlset> element found"));
    }

    Ok(entries)
}

/// Attach an `<xhtml:link>` to the entry being built, if it is a usable alternate.
fn push_alternate(current: &mut Option<SitemapEntry>, element: &BytesStart<'_>) -> Result<()> {
    let Some(entry) = current.as_mut() else {
        return Ok(());
    };

    let mut rel = None;
    let mut hreflang = None;
    let mut href = None;

    for attr in element.attributes() {
        let attr = attr.map_err(|e| KbScrapeError::sitemap(format!("bad attribute: {e}")))?;
        let value = attr
            .unescape_value()
            .map_err(|e| KbScrapeError::sitemap(format!("bad attribute value: {e}")))?
            .into_owned();
        match attr.key.local_name().as_ref() {
            b"rel" => rel = Some(value),
            b"hreflang" => hreflang = Some(value),
            b"href" => href = Some(value),
            _ => {}
        }
    }

    if rel.as_deref().is_some_and(|r| r != "alternate") {
        return Ok(());
    }
    if let (Some(hreflang), Some(href)) = (hreflang, href) {
        entry.alternates.push(Alternate { hreflang, href });
    }
    Ok(())
}
