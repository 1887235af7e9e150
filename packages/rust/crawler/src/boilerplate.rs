//! BoilerplateStripper: removes the knowledge base's recurring page chrome.
//!
//! Stripping is a fixed sequence of [`StripPass`] steps applied to an owned
//! document. Order matters: later passes see the tree left by earlier ones
//! (the final "first `<ul>`" pass relies on the navigation lists being gone).
//!
//! Text markers are data ([`MarkerRule`]). A marker that matches nothing is
//! skipped; the rule's [`Optionality`] only decides the log level.

use scraper::{ElementRef, Html};
use tracing::{debug, trace, warn};

use crate::dom::{detach, detach_all, element_text, elements, elements_named};

/// Paragraphs with fewer characters than this are treated as chrome.
pub const MIN_PARAGRAPH_CHARS: usize = 25;

// ---------------------------------------------------------------------------
// Rule data
// ---------------------------------------------------------------------------

/// Which elements a marker rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Only elements with this tag name.
    Named(&'static str),
    /// Any element. Only the innermost elements holding the marker count,
    /// otherwise `<html>` would always be the first match.
    Any,
}

/// Which of several matching elements is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    First,
    Last,
}

/// How loudly a missing marker is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optionality {
    /// Expected on every article; a miss is logged at `warn`.
    Required,
    /// Present on some articles only; a miss is logged at `debug`.
    Optional,
}

/// Remove one element whose text contains `marker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRule {
    pub name: &'static str,
    pub marker: &'static str,
    pub tag: TagKind,
    pub policy: MatchPolicy,
    pub optionality: Optionality,
}

impl MarkerRule {
    /// Matching elements in document order.
    fn candidates(&self, doc: &Html) -> Vec<ego_tree::NodeId> {
        elements(doc)
            .filter(|el| match self.tag {
                TagKind::Named(name) => el.value().name() == name,
                TagKind::Any => true,
            })
            .filter(|el| element_text(*el).contains(self.marker))
            .filter(|el| self.tag != TagKind::Any || !self.has_matching_child(*el))
            .map(|el| el.id())
            .collect()
    }

    fn has_matching_child(&self, el: ElementRef<'_>) -> bool {
        el.children()
            .filter_map(ElementRef::wrap)
            .any(|child| element_text(child).contains(self.marker))
    }
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// One step of the stripping sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripPass {
    /// Remove every element with one of these tag names.
    Structural(&'static [&'static str]),
    /// Remove the element selected by a text marker.
    Marker(MarkerRule),
    /// Remove every `<p>` shorter than `min_chars` characters.
    ShortParagraphs { min_chars: usize },
    /// Remove the first element with this tag name.
    FirstOfTag(&'static str),
}

impl StripPass {
    /// Name used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Structural(_) => "structural",
            Self::Marker(rule) => rule.name,
            Self::ShortParagraphs { .. } => "short-paragraphs",
            Self::FirstOfTag(_) => "first-of-tag",
        }
    }

    /// Apply the pass and return how many subtrees were removed.
    pub fn apply(&self, doc: &mut Html) -> usize {
        match *self {
            Self::Structural(tags) => {
                let ids: Vec<_> = elements(doc)
                    .filter(|el| tags.iter().any(|t| *t == el.value().name()))
                    .map(|el| el.id())
                    .collect();
                detach_all(doc, ids)
            }
            Self::Marker(rule) => {
                let candidates = rule.candidates(doc);
                let target = match rule.policy {
                    MatchPolicy::First => candidates.first(),
                    MatchPolicy::Last => candidates.last(),
                };
                match target {
                    Some(id) => usize::from(detach(doc, *id)),
                    None => {
                        match rule.optionality {
                            Optionality::Required => {
                                warn!(rule = rule.name, marker = rule.marker, "marker not found")
                            }
                            Optionality::Optional => {
                                debug!(rule = rule.name, marker = rule.marker, "marker not found")
                            }
                        }
                        0
                    }
                }
            }
            Self::ShortParagraphs { min_chars } => {
                let ids: Vec<_> = elements(doc)
                    .filter(|el| el.value().name() == "p")
                    .filter(|el| element_text(*el).chars().count() < min_chars)
                    .map(|el| el.id())
                    .collect();
                detach_all(doc, ids)
            }
            Self::FirstOfTag(tag) => match elements_named(doc, tag).first() {
                Some(id) => usize::from(detach(doc, *id)),
                None => {
                    debug!(tag, "no element left to remove");
                    0
                }
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Stripper
// ---------------------------------------------------------------------------

/// Per-pass removal counts, in pass order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripReport {
    pub removed: Vec<(&'static str, usize)>,
}

impl StripReport {
    /// Total subtrees removed by all passes.
    pub fn total(&self) -> usize {
        self.removed.iter().map(|(_, n)| n).sum()
    }
}

/// An ordered list of strip passes.
#[derive(Debug, Clone)]
pub struct BoilerplateStripper {
    passes: Vec<StripPass>,
}

impl BoilerplateStripper {
    pub fn new(passes: Vec<StripPass>) -> Self {
        Self { passes }
    }

    pub fn passes(&self) -> &[StripPass] {
        &self.passes
    }

    /// Run every pass in order over `doc`.
    pub fn strip(&self, doc: &mut Html) -> StripReport {
        let mut report = StripReport::default();
        for pass in &self.passes {
            let removed = pass.apply(doc);
            trace!(pass = pass.name(), removed, "strip pass done");
            report.removed.push((pass.name(), removed));
        }
        report
    }
}

impl Default for BoilerplateStripper {
    /// The help-center sequence.
    fn default() -> Self {
        use MatchPolicy::{First, Last};
        use Optionality::{Optional, Required};

        let rule = |name, marker, tag, policy, optionality| {
            StripPass::Marker(MarkerRule {
                name,
                marker,
                tag,
                policy,
                optionality,
            })
        };

        Self::new(vec![
            StripPass::Structural(&["footer", "header", "nav", "script"]),
            rule("still-have-questions", "Still have questions?", TagKind::Named("div"), Last, Required),
            rule("rating", "helpful?", TagKind::Named("div"), Last, Required),
            rule("language-availability", "also available in", TagKind::Named("div"), Last, Optional),
            rule("comments", "Comments", TagKind::Named("div"), Last, Optional),
            rule("breadcrumb", "Home", TagKind::Named("ul"), First, Optional),
            rule("last-updated", "Last updated", TagKind::Any, First, Optional),
            rule("relevant-for", "Relevant for:", TagKind::Any, First, Optional),
            StripPass::ShortParagraphs {
                min_chars: MIN_PARAGRAPH_CHARS,
            },
            StripPass::FirstOfTag("ul"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture(name: &str) -> Html {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/html")
            .join(name);
        let content = std::fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("missing fixture: {}", path.display()));
        Html::parse_document(&content)
    }

    fn rule(marker: &'static str, tag: TagKind, policy: MatchPolicy) -> StripPass {
        StripPass::Marker(MarkerRule {
            name: "test",
            marker,
            tag,
            policy,
            optionality: Optionality::Optional,
        })
    }

    #[test]
    fn structural_pass_removes_all_targets() {
        let mut doc = Html::parse_document(
            "<html><body><header>h</header><nav>n</nav><p>body text</p>\
             <script>x()</script><footer>f</footer><footer>g</footer></body></html>",
        );
        let removed = StripPass::Structural(&["footer", "header", "nav", "script"]).apply(&mut doc);
        assert_eq!(removed, 5);
        assert_eq!(doc.root_element().text().collect::<String>(), "body text");
    }

    #[test]
    fn nested_structural_targets_count_once() {
        let mut doc = Html::parse_document(
            "<html><body><header><nav>n</nav><script>x()</script></header><p>body text</p></body></html>",
        );
        let removed = StripPass::Structural(&["footer", "header", "nav", "script"]).apply(&mut doc);
        assert_eq!(removed, 1);
        assert_eq!(doc.root_element().text().collect::<String>(), "body text");
    }

    #[test]
    fn last_policy_removes_last_match() {
        let mut doc = Html::parse_document(
            "<html><body><div id=a><p>Still have questions? early</p></div>\
             <div id=b><p>Still have questions? late</p></div></body></html>",
        );
        let removed = rule("Still have questions?", TagKind::Named("div"), MatchPolicy::Last)
            .apply(&mut doc);
        assert_eq!(removed, 1);
        let html = doc.html();
        assert!(html.contains("early"));
        assert!(!html.contains("late"));
    }

    #[test]
    fn first_policy_removes_first_match() {
        let mut doc = Html::parse_document(
            "<html><body><ul><li>Home</li><li>one</li></ul><ul><li>Home</li><li>two</li></ul></body></html>",
        );
        rule("Home", TagKind::Named("ul"), MatchPolicy::First).apply(&mut doc);
        let html = doc.html();
        assert!(!html.contains("one"));
        assert!(html.contains("two"));
    }

    #[test]
    fn any_tag_rule_removes_innermost_element() {
        let mut doc = Html::parse_document(
            "<html><body><div><span>Last updated 2 days ago</span><p>kept paragraph</p></div></body></html>",
        );
        let removed = rule("Last updated", TagKind::Any, MatchPolicy::First).apply(&mut doc);
        assert_eq!(removed, 1);
        let html = doc.html();
        assert!(!html.contains("Last updated"));
        assert!(html.contains("kept paragraph"));
    }

    #[test]
    fn missing_marker_is_tolerated() {
        let mut doc = Html::parse_document("<html><body><p>nothing to see here</p></body></html>");
        let before = doc.html();
        let required = StripPass::Marker(MarkerRule {
            name: "rating",
            marker: "helpful?",
            tag: TagKind::Named("div"),
            policy: MatchPolicy::Last,
            optionality: Optionality::Required,
        });
        assert_eq!(required.apply(&mut doc), 0);
        assert_eq!(doc.html(), before);
    }

    #[test]
    fn short_paragraph_threshold() {
        // 24 characters is removed, 25 is kept; counted in chars, not bytes.
        let short = "a".repeat(24);
        let exact = "b".repeat(25);
        let accented = "č".repeat(25);
        let mut doc = Html::parse_document(&format!(
            "<html><body><p>{short}</p><p>{exact}</p><p>{accented}</p></body></html>"
        ));
        let removed = StripPass::ShortParagraphs { min_chars: 25 }.apply(&mut doc);
        assert_eq!(removed, 1);
        let html = doc.html();
        assert!(!html.contains(&short));
        assert!(html.contains(&exact));
        assert!(html.contains(&accented));
    }

    #[test]
    fn first_of_tag_removes_one() {
        let mut doc = Html::parse_document(
            "<html><body><ul><li>left</li></ul><ul><li>right</li></ul></body></html>",
        );
        assert_eq!(StripPass::FirstOfTag("ul").apply(&mut doc), 1);
        assert_eq!(elements_named(&doc, "ul").len(), 1);
        assert!(doc.html().contains("right"));
    }

    #[test]
    fn default_sequence_order() {
        let names: Vec<&str> = BoilerplateStripper::default()
            .passes()
            .iter()
            .map(StripPass::name)
            .collect();
        assert_eq!(
            names,
            vec![
                "structural",
                "still-have-questions",
                "rating",
                "language-availability",
                "comments",
                "breadcrumb",
                "last-updated",
                "relevant-for",
                "short-paragraphs",
                "first-of-tag",
            ]
        );
    }

    #[test]
    fn support_section_is_removed_from_article() {
        let mut doc = load_fixture("article.html");
        let report = BoilerplateStripper::default().strip(&mut doc);
        let html = doc.html();

        assert!(!html.contains("Still have questions?"));
        assert!(!html.contains("helpful?"));
        assert!(!html.contains("Last updated"));
        assert!(!html.contains("Relevant for:"));
        assert!(!html.contains("also available in"));
        assert!(!html.contains("Be the first to comment"));
        assert!(elements_named(&doc, "ul").is_empty());
        assert!(html.contains("isopropyl alcohol"));
        assert!(report.total() > 0);
    }

    #[test]
    fn stripping_is_idempotent_once_targets_are_exhausted() {
        let stripper = BoilerplateStripper::default();
        let mut doc = load_fixture("article.html");
        stripper.strip(&mut doc);
        let once = doc.html();

        let report = stripper.strip(&mut doc);
        assert_eq!(report.total(), 0);
        assert_eq!(doc.html(), once);
    }
}
