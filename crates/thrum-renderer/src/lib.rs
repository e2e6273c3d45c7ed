//! thrum-renderer: HTML rendering of document trees.
//!
//! Renders a [`thrum_document::Document`] into an HTML string, with a
//! trusted-fallback degrade path for records that only carry precomputed
//! HTML. Rendering is total: malformed trees render to nothing rather than
//! erroring, since corrupt historical content must not crash the viewer.

pub mod html;

pub use html::{push_html, render_html};
