//! Plain-text extraction from document trees.
//!
//! Extraction feeds search indexing and submit-time validation, not display:
//! container boundaries contribute no separators, so a multi-paragraph
//! document collapses to one run of text. Changing that would silently alter
//! search-matching semantics, so it stays.

use crate::node::{Document, DocumentNode};

/// Concatenate the text content of a document, pre-order and left-to-right,
/// trimmed of leading/trailing whitespace.
///
/// Total over any structurally-valid tree: `None` and malformed shapes yield
/// `""`, never an error.
pub fn extract_text(doc: Option<&Document>) -> String {
    let mut out = String::new();
    if let Some(doc) = doc {
        collect(&doc.root, &mut out);
    }
    out.trim().to_owned()
}

fn collect(node: &DocumentNode, out: &mut String) {
    match node {
        DocumentNode::Text { text, .. } => out.push_str(text),
        DocumentNode::LineBreak => {}
        _ => {
            if let Some(children) = node.children() {
                for child in children {
                    collect(child, out);
                }
            }
        }
    }
}
