//! thrum-document: the rich-content document tree.
//!
//! This crate provides:
//! - `DocumentNode` - the tagged node tree (root, paragraph, text, links, linebreak)
//! - `Document` - the single-root wrapper and its JSON wire shape
//! - `TextFormat` - the per-text format bit-field
//! - `extract_text` - plain-text extraction for search and validation

pub mod extract;
pub mod node;

pub use extract::extract_text;
pub use node::{Document, DocumentNode, TextFormat};
