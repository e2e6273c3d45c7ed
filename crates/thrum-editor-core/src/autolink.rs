//! URL auto-detection over settled text.
//!
//! Two shapes are recognized: absolute `http(s)://` URLs, and bare `www.`
//! hosts which are canonicalized to `https://` when converted. Matching
//! spans in text nodes are replaced in place by autolink nodes wrapping the
//! matched substring. Detection is idempotent: text already inside a link of
//! either provenance is never rescanned, so re-running on a converted tree
//! is a no-op.

use regex::Regex;
use std::sync::LazyLock;
use thrum_document::{Document, DocumentNode, TextFormat};
use url::Url;

/// Absolute URLs and bare `www.` hosts, with optional port and optional
/// path/query/fragment tail.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://|www\.)[A-Za-z0-9][A-Za-z0-9\-.]*(?::\d{1,5})?(?:[/?#][^\s]*)?")
        .unwrap()
});

/// Run detection over the whole document. Returns whether anything changed.
pub fn detect_links(doc: &mut Document) -> bool {
    let changed = scan(&mut doc.root);
    if changed {
        tracing::trace!("autolink pass rewrote the tree");
    }
    changed
}

/// The canonical `url` value for a matched span, or `None` when the match
/// does not survive a real parse.
fn canonical_url(matched: &str) -> Option<String> {
    let candidate = if matched.starts_with("www.") {
        format!("https://{matched}")
    } else {
        matched.to_owned()
    };
    // Keep the original spelling; parsing is only a validity gate.
    Url::parse(&candidate).ok().map(|_| candidate)
}

fn scan(node: &mut DocumentNode) -> bool {
    // Text inside an existing link stays untouched.
    if node.is_link() {
        return false;
    }
    let Some(children) = node.children_mut() else {
        return false;
    };

    let mut changed = false;
    let mut rewritten: Vec<DocumentNode> = Vec::with_capacity(children.len());
    for mut child in children.drain(..) {
        let split = match &child {
            DocumentNode::Text { text, format } => split_text(text, *format),
            _ => None,
        };
        match split {
            Some(parts) => {
                rewritten.extend(parts);
                changed = true;
            }
            None => {
                changed |= scan(&mut child);
                rewritten.push(child);
            }
        }
    }
    *children = rewritten;
    changed
}

/// Split a text run around its URL matches, or `None` when nothing matched
/// the patterns and survived the parse gate.
fn split_text(text: &str, format: TextFormat) -> Option<Vec<DocumentNode>> {
    let mut parts = Vec::new();
    let mut last = 0;
    for found in URL_RE.find_iter(text) {
        let Some(url) = canonical_url(found.as_str()) else {
            continue;
        };
        if found.start() > last {
            parts.push(DocumentNode::text(&text[last..found.start()], format));
        }
        parts.push(DocumentNode::AutoLink {
            url: Some(url),
            children: vec![DocumentNode::text(found.as_str(), format)],
        });
        last = found.end();
    }
    if last == 0 {
        return None;
    }
    if last < text.len() {
        parts.push(DocumentNode::text(&text[last..], format));
    }
    Some(parts)
}
