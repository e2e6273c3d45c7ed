//! Document tree nodes and their JSON wire shape.
//!
//! A stored document is either JSON `null` (no content) or an object with a
//! single `root` key. Nodes are internally tagged with `"type"`; unrecognized
//! node kinds deserialize into [`DocumentNode::Unknown`] so historical records
//! with nodes this build does not know about still load, render their
//! children, and round-trip with the original type string intact.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

bitflags! {
    /// Per-text format bit-field.
    ///
    /// Stored on the wire as a plain non-negative integer. Bits beyond the
    /// named ones are preserved through (de)serialization and ignored by the
    /// renderer, so newer writers don't break older readers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextFormat: u32 {
        const BOLD = 1;
        const ITALIC = 2;
        const UNDERLINE = 4;
    }
}

impl TextFormat {
    /// Reconstruct from a wire integer, keeping unrecognized bits.
    pub fn from_wire(bits: u32) -> Self {
        Self::from_bits_retain(bits)
    }
}

/// One node of the rich-content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub enum DocumentNode {
    /// Document root. Exactly one per document, always outermost.
    Root { children: Vec<DocumentNode> },
    /// One visual line-block of inline children.
    Paragraph { children: Vec<DocumentNode> },
    /// Leaf text run with format flags.
    Text { text: String, format: TextFormat },
    /// Explicit user-inserted link.
    Link {
        url: Option<String>,
        children: Vec<DocumentNode>,
    },
    /// Link produced by automatic URL detection. Renders identically to
    /// [`DocumentNode::Link`].
    AutoLink {
        url: Option<String>,
        children: Vec<DocumentNode>,
    },
    /// Hard line break, no payload.
    LineBreak,
    /// Unrecognized node kind: an opaque container. Contributes no markup of
    /// its own, but its children are still traversed.
    Unknown {
        kind: SmolStr,
        children: Vec<DocumentNode>,
    },
}

impl DocumentNode {
    pub fn text(text: impl Into<String>, format: TextFormat) -> Self {
        Self::Text {
            text: text.into(),
            format,
        }
    }

    pub fn paragraph(children: Vec<DocumentNode>) -> Self {
        Self::Paragraph { children }
    }

    pub fn link(url: impl Into<String>, children: Vec<DocumentNode>) -> Self {
        Self::Link {
            url: Some(url.into()),
            children,
        }
    }

    /// An auto-detected link wrapping the matched text verbatim.
    pub fn autolink(url: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::AutoLink {
            url: Some(url.into()),
            children: vec![Self::text(text, TextFormat::empty())],
        }
    }

    /// Ordered children, if this node is a container.
    pub fn children(&self) -> Option<&[DocumentNode]> {
        match self {
            Self::Root { children }
            | Self::Paragraph { children }
            | Self::Link { children, .. }
            | Self::AutoLink { children, .. }
            | Self::Unknown { children, .. } => Some(children),
            Self::Text { .. } | Self::LineBreak => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<DocumentNode>> {
        match self {
            Self::Root { children }
            | Self::Paragraph { children }
            | Self::Link { children, .. }
            | Self::AutoLink { children, .. }
            | Self::Unknown { children, .. } => Some(children),
            Self::Text { .. } | Self::LineBreak => None,
        }
    }

    /// Whether this node is a link of either provenance.
    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link { .. } | Self::AutoLink { .. })
    }
}

/// A complete document: one root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub root: DocumentNode,
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl Document {
    /// A document with an empty root.
    pub fn empty() -> Self {
        Self {
            root: DocumentNode::Root { children: vec![] },
        }
    }

    pub fn new(children: Vec<DocumentNode>) -> Self {
        Self {
            root: DocumentNode::Root { children },
        }
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.root.children().is_none_or(|c| c.is_empty())
    }

    /// Parse a stored document. `null`, missing `root`, or malformed JSON all
    /// yield `None` rather than an error: corrupt historical content must not
    /// take the viewer down with it.
    pub fn parse(json: &str) -> Option<Document> {
        match serde_json::from_str::<Option<Document>>(json) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::debug!(%err, "discarding unparseable document");
                None
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Wire-shape mirror of [`DocumentNode`]. All payload fields are optional on
/// input; absent `children` is leaf behavior, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    kind: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<RawNode>>,
}

impl From<RawNode> for DocumentNode {
    fn from(raw: RawNode) -> Self {
        let RawNode {
            kind,
            text,
            format,
            url,
            children,
        } = raw;
        let children: Vec<DocumentNode> = children
            .unwrap_or_default()
            .into_iter()
            .map(DocumentNode::from)
            .collect();
        match kind.as_str() {
            "root" => Self::Root { children },
            "paragraph" => Self::Paragraph { children },
            "text" => Self::Text {
                text: text.unwrap_or_default(),
                format: TextFormat::from_wire(format.unwrap_or(0)),
            },
            "link" => Self::Link { url, children },
            "autolink" => Self::AutoLink { url, children },
            "linebreak" => Self::LineBreak,
            _ => Self::Unknown {
                kind: kind.clone(),
                children,
            },
        }
    }
}

impl From<DocumentNode> for RawNode {
    fn from(node: DocumentNode) -> Self {
        let raw = |kind: &str| RawNode {
            kind: SmolStr::new(kind),
            text: None,
            format: None,
            url: None,
            children: None,
        };
        let wrap = |children: Vec<DocumentNode>| {
            Some(children.into_iter().map(RawNode::from).collect::<Vec<_>>())
        };
        match node {
            DocumentNode::Root { children } => RawNode {
                children: wrap(children),
                ..raw("root")
            },
            DocumentNode::Paragraph { children } => RawNode {
                children: wrap(children),
                ..raw("paragraph")
            },
            DocumentNode::Text { text, format } => RawNode {
                text: Some(text),
                format: Some(format.bits()),
                ..raw("text")
            },
            DocumentNode::Link { url, children } => RawNode {
                url,
                children: wrap(children),
                ..raw("link")
            },
            DocumentNode::AutoLink { url, children } => RawNode {
                url,
                children: wrap(children),
                ..raw("autolink")
            },
            DocumentNode::LineBreak => raw("linebreak"),
            DocumentNode::Unknown { kind, children } => RawNode {
                children: if children.is_empty() {
                    None
                } else {
                    wrap(children)
                },
                ..raw(kind.as_str())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_stored_shape() {
        let json = r#"{
            "root": {
                "type": "root",
                "children": [
                    {
                        "type": "paragraph",
                        "children": [
                            {"type": "text", "text": "hello ", "format": 0},
                            {"type": "text", "text": "world", "format": 3}
                        ]
                    }
                ]
            }
        }"#;

        let doc = Document::parse(json).unwrap();
        let root_children = doc.root.children().unwrap();
        assert_eq!(root_children.len(), 1);

        let para = root_children[0].children().unwrap();
        assert_eq!(
            para[0],
            DocumentNode::text("hello ", TextFormat::empty())
        );
        assert_eq!(
            para[1],
            DocumentNode::text("world", TextFormat::BOLD | TextFormat::ITALIC)
        );
    }

    #[test]
    fn test_null_and_malformed_parse_to_none() {
        assert_eq!(Document::parse("null"), None);
        assert_eq!(Document::parse("{}"), None);
        assert_eq!(Document::parse("{\"root\":"), None);
        assert_eq!(Document::parse("not json at all"), None);
    }

    #[test]
    fn test_unknown_node_kind_is_opaque_container() {
        let json = r#"{
            "root": {
                "type": "root",
                "children": [
                    {
                        "type": "collapsible-container",
                        "children": [{"type": "text", "text": "inside"}]
                    }
                ]
            }
        }"#;

        let doc = Document::parse(json).unwrap();
        let node = &doc.root.children().unwrap()[0];
        match node {
            DocumentNode::Unknown { kind, children } => {
                assert_eq!(kind, "collapsible-container");
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected Unknown, got {other:?}"),
        }

        // The original type string survives a round-trip.
        let json = doc.to_json().unwrap();
        assert!(json.contains("collapsible-container"));
        assert_eq!(Document::parse(&json).unwrap(), doc);
    }

    #[test]
    fn test_missing_fields_default() {
        // No children, no format, no text anywhere: still loads.
        let json = r#"{"root": {"type": "root", "children": [
            {"type": "paragraph"},
            {"type": "text"},
            {"type": "link", "children": [{"type": "text", "text": "x"}]}
        ]}}"#;

        let doc = Document::parse(json).unwrap();
        let children = doc.root.children().unwrap();
        assert_eq!(children[0], DocumentNode::paragraph(vec![]));
        assert_eq!(children[1], DocumentNode::text("", TextFormat::empty()));
        match &children[2] {
            DocumentNode::Link { url, .. } => assert_eq!(*url, None),
            other => panic!("expected Link, got {other:?}"),
        }
    }

    #[test]
    fn test_unrecognized_format_bits_survive() {
        let json = r#"{"root": {"type": "root", "children": [
            {"type": "paragraph", "children": [
                {"type": "text", "text": "x", "format": 133}
            ]}
        ]}}"#;

        let doc = Document::parse(json).unwrap();
        let reparsed = Document::parse(&doc.to_json().unwrap()).unwrap();
        let para = reparsed.root.children().unwrap()[0].children().unwrap();
        match &para[0] {
            DocumentNode::Text { format, .. } => {
                assert_eq!(format.bits(), 133);
                assert!(format.contains(TextFormat::BOLD));
                assert!(format.contains(TextFormat::UNDERLINE));
            }
            other => panic!("expected Text, got {other:?}"),
        }
    }

    #[test]
    fn test_serialize_shape_is_tagged_camel_case() {
        let doc = Document::new(vec![DocumentNode::paragraph(vec![
            DocumentNode::text("hi", TextFormat::BOLD),
            DocumentNode::LineBreak,
            DocumentNode::autolink("https://example.com", "example.com"),
        ])]);

        let value: serde_json::Value =
            serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        let para = &value["root"]["children"][0];
        assert_eq!(para["type"], "paragraph");
        assert_eq!(para["children"][0]["type"], "text");
        assert_eq!(para["children"][0]["format"], 1);
        assert_eq!(para["children"][1]["type"], "linebreak");
        assert_eq!(para["children"][2]["type"], "autolink");
        assert_eq!(para["children"][2]["url"], "https://example.com");
    }

    #[test]
    fn test_is_empty() {
        assert!(Document::empty().is_empty());
        let doc = Document::new(vec![DocumentNode::paragraph(vec![])]);
        assert!(!doc.is_empty());
    }
}
