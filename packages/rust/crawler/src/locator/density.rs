//! Paragraph-density locator.
//!
//! Every `<p>` votes for its direct parent; the parent with the most votes is
//! the article body. Scores are keyed by the arena [`NodeId`], so equal-looking
//! containers never collapse into one key.

use std::collections::HashMap;

use ego_tree::NodeId;
use kbscrape_shared::{KbScrapeError, Result};
use scraper::{ElementRef, Html};
use tracing::debug;

use super::ContentLocator;
use crate::dom::elements;

/// A parent element and the number of `<p>` children it directly holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentCandidate {
    pub node: NodeId,
    pub score: usize,
}

/// Score every direct parent of a `<p>`, in order of first appearance.
pub fn score_candidates(doc: &Html) -> Vec<ContentCandidate> {
    let mut candidates: Vec<ContentCandidate> = Vec::new();
    let mut index: HashMap<NodeId, usize> = HashMap::new();

    for p in elements(doc).filter(|el| el.value().name() == "p") {
        let Some(parent) = p.parent() else { continue };
        let slot = *index.entry(parent.id()).or_insert_with(|| {
            candidates.push(ContentCandidate {
                node: parent.id(),
                score: 0,
            });
            candidates.len() - 1
        });
        candidates[slot].score += 1;
    }

    candidates
}

/// Highest score wins; on a tie the parent seen first is kept.
pub fn best_candidate(candidates: &[ContentCandidate]) -> Option<ContentCandidate> {
    candidates
        .iter()
        .copied()
        .fold(None, |best: Option<ContentCandidate>, c| match best {
            Some(b) if b.score >= c.score => Some(b),
            _ => Some(c),
        })
}

/// The default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DensityLocator;

impl ContentLocator for DensityLocator {
    fn locate(&self, doc: &Html, url: &str) -> Result<String> {
        let candidates = score_candidates(doc);
        let best = best_candidate(&candidates).ok_or_else(|| KbScrapeError::NoContentFound {
            url: url.to_string(),
        })?;

        let node = doc
            .tree
            .get(best.node)
            .and_then(ElementRef::wrap)
            .ok_or_else(|| KbScrapeError::NoContentFound {
                url: url.to_string(),
            })?;

        debug!(
            candidates = candidates.len(),
            score = best.score,
            tag = node.value().name(),
            "content container selected"
        );
        Ok(node.html())
    }

    fn name(&self) -> &str {
        "density"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(n: usize, label: &str) -> String {
        (0..n)
            .map(|i| format!("<p>{label} paragraph number {i} with enough text</p>"))
            .collect()
    }

    #[test]
    fn five_paragraphs_beat_two() {
        let html = format!(
            "<html><body><div id=short>{}</div><div id=long>{}</div></body></html>",
            paragraphs(2, "short"),
            paragraphs(5, "long"),
        );
        let doc = Html::parse_document(&html);
        let fragment = DensityLocator.locate(&doc, "https://h/a_1").unwrap();
        assert!(fragment.starts_with(r#"<div id="long">"#));
        assert!(!fragment.contains("short paragraph"));
    }

    #[test]
    fn tie_goes_to_first_parent() {
        let html = format!(
            "<html><body><section>{}</section><article>{}</article></body></html>",
            paragraphs(3, "first"),
            paragraphs(3, "second"),
        );
        let doc = Html::parse_document(&html);
        let fragment = DensityLocator.locate(&doc, "https://h/a_1").unwrap();
        assert!(fragment.starts_with("<section>"));
    }

    #[test]
    fn only_direct_children_count() {
        let html = format!(
            "<html><body><div id=outer><div id=inner>{}</div>{}</div></body></html>",
            paragraphs(3, "inner"),
            paragraphs(1, "outer"),
        );
        let doc = Html::parse_document(&html);
        let scores: Vec<usize> = score_candidates(&doc).iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![3, 1]);
    }

    #[test]
    fn locator_is_deterministic() {
        let html = format!(
            "<html><body><div>{}</div><div>{}</div><div>{}</div></body></html>",
            paragraphs(4, "a"),
            paragraphs(4, "b"),
            paragraphs(2, "c"),
        );
        let first = DensityLocator
            .locate(&Html::parse_document(&html), "https://h/a_1")
            .unwrap();
        for _ in 0..5 {
            let again = DensityLocator
                .locate(&Html::parse_document(&html), "https://h/a_1")
                .unwrap();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn no_paragraphs_is_no_content() {
        let doc = Html::parse_document("<html><body><div><span>text only</span></div></body></html>");
        let err = DensityLocator.locate(&doc, "https://h/a_1").unwrap_err();
        assert!(matches!(err, KbScrapeError::NoContentFound { .. }));
    }
}
