//! HTML writer for document trees.

use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_href, escape_html_body_text};
use thrum_document::{Document, DocumentNode, TextFormat};

/// Render a document to HTML.
///
/// - A document with a non-empty root renders recursively.
/// - An absent or empty document with a non-empty `html_fallback` returns the
///   fallback verbatim, as trusted markup. The caller is responsible for
///   having sanitized it upstream; this is the degrade path for legacy
///   records, not the primary path.
/// - Otherwise `None`.
pub fn render_html(doc: Option<&Document>, html_fallback: Option<&str>) -> Option<String> {
    if let Some(doc) = doc
        && !doc.is_empty()
    {
        let mut out = String::new();
        push_html(&mut out, doc)?;
        return Some(out);
    }
    match html_fallback {
        Some(html) if !html.is_empty() => Some(html.to_owned()),
        _ => None,
    }
}

/// Append the HTML rendering of `doc` to `out`.
///
/// Returns `None` if the underlying writer failed (which a `String` sink
/// cannot), so callers degrade to "render nothing" instead of panicking.
pub fn push_html(out: &mut String, doc: &Document) -> Option<()> {
    let mut writer = HtmlWriter {
        writer: FmtWriter(&mut *out),
    };
    match writer.node(&doc.root) {
        Ok(()) => Some(()),
        Err(err) => {
            tracing::debug!(%err, "html rendering failed");
            None
        }
    }
}

struct HtmlWriter<W> {
    writer: W,
}

impl<W: StrWrite> HtmlWriter<W> {
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)
    }

    fn children(&mut self, children: &[DocumentNode]) -> Result<(), W::Error> {
        for child in children {
            self.node(child)?;
        }
        Ok(())
    }

    fn node(&mut self, node: &DocumentNode) -> Result<(), W::Error> {
        match node {
            DocumentNode::Root { children } => self.children(children),
            DocumentNode::Paragraph { children } => {
                self.write("<p>")?;
                self.children(children)?;
                self.write("</p>")
            }
            DocumentNode::Text { text, format } => self.text(text, *format),
            DocumentNode::Link { url, children } | DocumentNode::AutoLink { url, children } => {
                self.anchor(url.as_deref(), children)
            }
            DocumentNode::LineBreak => self.write("<br />"),
            // Unknown kinds contribute no markup of their own.
            DocumentNode::Unknown { children, .. } => self.children(children),
        }
    }

    /// Escaped text with format wrappers, underline outermost:
    /// `<u><em><strong>text</strong></em></u>`.
    fn text(&mut self, text: &str, format: TextFormat) -> Result<(), W::Error> {
        if format.contains(TextFormat::UNDERLINE) {
            self.write("<u>")?;
        }
        if format.contains(TextFormat::ITALIC) {
            self.write("<em>")?;
        }
        if format.contains(TextFormat::BOLD) {
            self.write("<strong>")?;
        }
        escape_html_body_text(&mut self.writer, text)?;
        if format.contains(TextFormat::BOLD) {
            self.write("</strong>")?;
        }
        if format.contains(TextFormat::ITALIC) {
            self.write("</em>")?;
        }
        if format.contains(TextFormat::UNDERLINE) {
            self.write("</u>")?;
        }
        Ok(())
    }

    fn anchor(&mut self, url: Option<&str>, children: &[DocumentNode]) -> Result<(), W::Error> {
        self.write("<a href=\"")?;
        escape_href(&mut self.writer, url.unwrap_or("#"))?;
        self.write("\" target=\"_blank\" rel=\"noopener noreferrer\">")?;
        self.children(children)?;
        self.write("</a>")
    }
}
