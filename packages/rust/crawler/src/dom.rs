//! Small helpers over `scraper::Html` shared by the stripper and the locators.

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

/// Concatenated descendant text of an element.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// All elements still attached to the document, in document order.
pub fn elements(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    doc.tree.root().descendants().filter_map(ElementRef::wrap)
}

/// Ids of all elements with the given tag name, in document order.
pub fn elements_named(doc: &Html, name: &str) -> Vec<NodeId> {
    elements(doc)
        .filter(|el| el.value().name() == name)
        .map(|el| el.id())
        .collect()
}

/// Detach a subtree from the document. Returns whether the node existed.
pub fn detach(doc: &mut Html, id: NodeId) -> bool {
    match doc.tree.get_mut(id) {
        Some(mut node) => {
            node.detach();
            true
        }
        None => false,
    }
}

/// Detach every listed subtree that is still attached to the document.
///
/// Nodes inside a subtree removed earlier in the same call are skipped, so the
/// count is the number of subtrees that actually left the tree.
pub fn detach_all(doc: &mut Html, ids: impl IntoIterator<Item = NodeId>) -> usize {
    let mut removed = 0;
    for id in ids {
        if is_attached(doc, id) && detach(doc, id) {
            removed += 1;
        }
    }
    removed
}

/// Whether a node is reachable from the document root.
fn is_attached(doc: &Html, id: NodeId) -> bool {
    let root = doc.tree.root().id();
    doc.tree
        .get(id)
        .is_some_and(|node| node.id() == root || node.ancestors().any(|a| a.id() == root))
}

/// Text of the first `<title>` element, trimmed.
pub fn title_text(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    doc.select(&selector)
        .next()
        .map(|el| element_text(el).trim().to_string())
}
