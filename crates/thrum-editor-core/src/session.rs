//! The editing session: exclusive owner of one document tree and its staged
//! image batch.

use bytes::Bytes;
use thrum_common::{Config, Submission};
use thrum_document::{Document, DocumentNode, TextFormat, extract_text};
use thrum_media::{CompressionRequest, Preset, UploadBatch, ValidationError};
use thrum_renderer::render_html;
use web_time::Instant;

use crate::actions::EditorAction;
use crate::autolink;
use crate::types::{Composition, EditorMode};

/// Session-scoped change listener: called with the tree and the freshly
/// extracted plain text after every document mutation.
pub type ChangeListener = Box<dyn FnMut(&Document, &str) + Send>;

/// One rich-content editing session (post, comment, or reply).
///
/// The session exclusively owns its document and upload batch; nothing else
/// mutates them. On submit the document is serialized and handed over by
/// value, and the session resets.
pub struct EditorSession {
    mode: EditorMode,
    document: Document,
    pending_format: TextFormat,
    composition: Composition,
    batch: UploadBatch,
    /// URLs of already-persisted images, populated when editing an existing
    /// record.
    existing_images: Vec<String>,
    max_images: usize,
    compression: CompressionRequest,
    on_change: Option<ChangeListener>,
    last_edit_at: Option<Instant>,
}

impl EditorSession {
    pub fn new(mode: EditorMode) -> Self {
        let max_images = mode.max_images();
        Self {
            mode,
            document: Document::empty(),
            pending_format: TextFormat::empty(),
            composition: Composition::Idle,
            batch: UploadBatch::new(max_images),
            existing_images: Vec::new(),
            max_images,
            compression: CompressionRequest::Smart,
            on_change: None,
            last_edit_at: None,
        }
    }

    /// A session with limits and compression mode taken from config.
    pub fn with_config(mode: EditorMode, config: &Config) -> Self {
        let mut session = Self::new(mode);
        session.max_images = mode.max_images_with(config);
        session.batch = UploadBatch::new(session.max_images);
        if !config.smart_compression {
            session.compression = CompressionRequest::Preset(Preset::Post);
        }
        session
    }

    /// Rebuild a session from a stored submission, for editing.
    pub fn hydrate(mode: EditorMode, submission: &Submission) -> Self {
        let mut session = Self::new(mode);
        session.document = submission
            .document_tree
            .clone()
            .unwrap_or_else(Document::empty);
        session.existing_images = submission.image_urls.clone();
        session
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn plain_text(&self) -> String {
        extract_text(Some(&self.document))
    }

    pub fn pending_format(&self) -> TextFormat {
        self.pending_format
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn is_composing(&self) -> bool {
        self.composition.is_composing()
    }

    pub fn batch(&self) -> &UploadBatch {
        &self.batch
    }

    pub fn existing_images(&self) -> &[String] {
        &self.existing_images
    }

    pub fn max_images(&self) -> usize {
        self.max_images
    }

    pub fn compression(&self) -> &CompressionRequest {
        &self.compression
    }

    /// When the document was last mutated, for idle detection.
    pub fn last_edit_at(&self) -> Option<Instant> {
        self.last_edit_at
    }

    pub fn set_on_change(&mut self, listener: ChangeListener) {
        self.on_change = Some(listener);
    }

    /// Central dispatch for editor actions. Returns whether session state
    /// changed.
    pub fn apply(&mut self, action: EditorAction) -> bool {
        match action {
            EditorAction::Insert { text } => self.insert_text(&text),
            EditorAction::InsertParagraph => self.insert_paragraph(),
            EditorAction::InsertLineBreak => self.insert_line_break(),
            EditorAction::ToggleFormat { format } => {
                self.toggle_format(format);
                true
            }
            EditorAction::BeginComposition => self.begin_composition(),
            EditorAction::UpdateComposition { text } => self.update_composition(text),
            EditorAction::EndComposition { text } => self.end_composition(&text),
            EditorAction::CancelComposition => self.cancel_composition(),
        }
    }

    /// Insert settled text at the end of the document, carrying the pending
    /// format. Link detection runs afterward unless a composition is open.
    pub fn insert_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let format = self.pending_format;
        let Some(paragraph) = self.tail_paragraph() else {
            return false;
        };
        match paragraph.last_mut() {
            Some(DocumentNode::Text {
                text: existing,
                format: existing_format,
            }) if *existing_format == format => existing.push_str(text),
            _ => paragraph.push(DocumentNode::text(text, format)),
        }
        if !self.composition.is_composing() {
            autolink::detect_links(&mut self.document);
        }
        self.touch();
        true
    }

    /// Start a new paragraph.
    pub fn insert_paragraph(&mut self) -> bool {
        if let Some(children) = self.document.root.children_mut() {
            children.push(DocumentNode::paragraph(vec![]));
        }
        self.touch();
        true
    }

    /// Hard line break within the current paragraph.
    pub fn insert_line_break(&mut self) -> bool {
        let Some(paragraph) = self.tail_paragraph() else {
            return false;
        };
        paragraph.push(DocumentNode::LineBreak);
        self.touch();
        true
    }

    /// Toggle format bits for subsequently inserted text. Already-inserted
    /// text keeps its format.
    pub fn toggle_format(&mut self, format: TextFormat) {
        self.pending_format.toggle(format);
    }

    pub fn begin_composition(&mut self) -> bool {
        if self.composition.is_composing() {
            return false;
        }
        self.composition = Composition::Composing {
            preview: String::new(),
        };
        true
    }

    pub fn update_composition(&mut self, text: String) -> bool {
        match &mut self.composition {
            Composition::Composing { preview } => {
                *preview = text;
                true
            }
            Composition::Idle => false,
        }
    }

    /// Commit the composed text. Detection over the now-settled document
    /// resumes here.
    pub fn end_composition(&mut self, text: &str) -> bool {
        if !self.composition.is_composing() {
            return false;
        }
        self.composition = Composition::Idle;
        if text.is_empty() {
            if autolink::detect_links(&mut self.document) {
                self.touch();
            }
            true
        } else {
            self.insert_text(text)
        }
    }

    pub fn cancel_composition(&mut self) -> bool {
        if !self.composition.is_composing() {
            return false;
        }
        self.composition = Composition::Idle;
        true
    }

    /// Validate and stage one pasted or picked image.
    pub fn stage_image(&mut self, name: &str, data: Bytes) -> Result<(), ValidationError> {
        let staged = self.existing_images.len() + self.batch.len();
        if staged + 1 > self.max_images {
            return Err(ValidationError::QuotaExceeded {
                staged,
                requested: 1,
                max: self.max_images,
            });
        }
        self.batch.stage(name, data)
    }

    pub fn remove_staged_image(&mut self, index: usize) -> bool {
        self.batch.remove(index).is_some()
    }

    pub fn remove_existing_image(&mut self, index: usize) -> bool {
        if index < self.existing_images.len() {
            self.existing_images.remove(index);
            true
        } else {
            false
        }
    }

    /// Reject empty submissions before any service call.
    pub fn validate(&self) -> Result<(), crate::publish::SubmitError> {
        let has_text = !self.plain_text().is_empty();
        let has_images = !self.batch.is_empty() || !self.existing_images.is_empty();
        if has_text || has_images {
            Ok(())
        } else {
            Err(crate::publish::SubmitError::EmptyContent)
        }
    }

    /// The boundary artifact for storage: tree, rendered HTML, plain text,
    /// and the full image URL list.
    pub fn submission(&self, image_urls: Vec<String>) -> Submission {
        let tree = (!self.document.is_empty()).then(|| self.document.clone());
        Submission {
            rendered_html: render_html(tree.as_ref(), None),
            plain_text: extract_text(tree.as_ref()),
            document_tree: tree,
            image_urls,
        }
    }

    /// Clear content after a successful submit or an explicit cancel. The
    /// batch is emptied, not dropped; the session stays usable.
    pub fn reset(&mut self) {
        self.document = Document::empty();
        self.pending_format = TextFormat::empty();
        self.composition = Composition::Idle;
        self.batch.clear();
        self.existing_images.clear();
        self.last_edit_at = None;
    }

    /// Children of the trailing paragraph, appending one if needed. `None`
    /// only for a corrupt non-container root (possible via hydration).
    fn tail_paragraph(&mut self) -> Option<&mut Vec<DocumentNode>> {
        let children = self.document.root.children_mut()?;
        if !matches!(children.last(), Some(DocumentNode::Paragraph { .. })) {
            children.push(DocumentNode::paragraph(vec![]));
        }
        match children.last_mut() {
            Some(DocumentNode::Paragraph { children }) => Some(children),
            _ => None,
        }
    }

    /// Record the edit and notify the listener.
    fn touch(&mut self) {
        self.last_edit_at = Some(Instant::now());
        if let Some(on_change) = self.on_change.as_mut() {
            let text = extract_text(Some(&self.document));
            on_change(&self.document, &text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn png_bytes() -> Bytes {
        Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0])
    }

    fn paragraph_children(doc: &Document) -> &[DocumentNode] {
        doc.root.children().unwrap()[0].children().unwrap()
    }

    #[test]
    fn test_insert_merges_same_format_runs() {
        let mut session = EditorSession::new(EditorMode::Post);
        session.insert_text("hel");
        session.insert_text("lo");

        let children = paragraph_children(session.document());
        assert_eq!(children.len(), 1);
        assert_eq!(session.plain_text(), "hello");
    }

    #[test]
    fn test_toggle_format_applies_to_new_text_only() {
        let mut session = EditorSession::new(EditorMode::Post);
        session.insert_text("plain ");
        session.apply(EditorAction::ToggleFormat {
            format: TextFormat::BOLD,
        });
        session.insert_text("bold");

        let children = paragraph_children(session.document());
        assert_eq!(children[0], DocumentNode::text("plain ", TextFormat::empty()));
        assert_eq!(children[1], DocumentNode::text("bold", TextFormat::BOLD));

        session.toggle_format(TextFormat::BOLD);
        assert_eq!(session.pending_format(), TextFormat::empty());
    }

    #[test]
    fn test_on_change_reports_tree_and_text() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let sink = seen.clone();

        let mut session = EditorSession::new(EditorMode::Post);
        session.set_on_change(Box::new(move |doc, text| {
            assert!(!doc.is_empty());
            sink.lock().unwrap().push(text.to_owned());
        }));

        session.insert_text("a");
        session.insert_text("b");
        assert_eq!(*seen.lock().unwrap(), vec!["a".to_owned(), "ab".to_owned()]);
    }

    #[test]
    fn test_typed_url_becomes_autolink() {
        let mut session = EditorSession::new(EditorMode::Post);
        session.insert_text("visit ");
        session.insert_text("http://example.com");
        session.insert_text(" now");

        let children = paragraph_children(session.document());
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], DocumentNode::text("visit ", TextFormat::empty()));
        assert_eq!(
            children[1],
            DocumentNode::autolink("http://example.com", "http://example.com")
        );
        assert_eq!(children[2], DocumentNode::text(" now", TextFormat::empty()));
    }

    #[test]
    fn test_detection_waits_for_composition_end() {
        let mut session = EditorSession::new(EditorMode::Post);
        session.apply(EditorAction::BeginComposition);
        session.insert_text("see www.example.com");

        // Mid-composition: nothing is linked yet.
        assert!(session.is_composing());
        assert_eq!(paragraph_children(session.document()).len(), 1);

        session.apply(EditorAction::EndComposition {
            text: String::new(),
        });
        assert!(!session.is_composing());
        let children = paragraph_children(session.document());
        assert_eq!(children.len(), 2);
        assert!(children[1].is_link());
    }

    #[test]
    fn test_composition_commit_inserts_and_detects() {
        let mut session = EditorSession::new(EditorMode::Post);
        session.apply(EditorAction::BeginComposition);
        session.apply(EditorAction::UpdateComposition {
            text: "わ".to_owned(),
        });
        assert_eq!(session.composition().preview(), Some("わ"));

        session.apply(EditorAction::EndComposition {
            text: "わたし".to_owned(),
        });
        assert_eq!(session.plain_text(), "わたし");
        assert!(!session.is_composing());
    }

    #[test]
    fn test_cancel_composition_discards_preview() {
        let mut session = EditorSession::new(EditorMode::Post);
        session.apply(EditorAction::BeginComposition);
        session.apply(EditorAction::UpdateComposition {
            text: "half".to_owned(),
        });
        session.apply(EditorAction::CancelComposition);

        assert!(!session.is_composing());
        assert_eq!(session.plain_text(), "");
    }

    #[test]
    fn test_paragraphs_and_line_breaks() {
        let mut session = EditorSession::new(EditorMode::Post);
        session.insert_text("one");
        session.apply(EditorAction::InsertParagraph);
        session.insert_text("two");
        session.apply(EditorAction::InsertLineBreak);
        session.insert_text("three");

        let root = session.document().root.children().unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(session.plain_text(), "onetwothree");
        let second = root[1].children().unwrap();
        assert!(matches!(second[1], DocumentNode::LineBreak));
    }

    #[test]
    fn test_comment_mode_image_quota() {
        let mut session = EditorSession::new(EditorMode::Comment);
        for i in 0..4 {
            session.stage_image(&format!("{i}.png"), png_bytes()).unwrap();
        }
        assert!(matches!(
            session.stage_image("over.png", png_bytes()),
            Err(ValidationError::QuotaExceeded { staged: 4, max: 4, .. })
        ));
    }

    #[test]
    fn test_existing_images_count_against_quota() {
        let submission = Submission {
            document_tree: None,
            rendered_html: None,
            plain_text: String::new(),
            image_urls: (0..3).map(|i| format!("memory://files/{i}/old.png")).collect(),
        };
        let mut session = EditorSession::hydrate(EditorMode::Comment, &submission);
        session.stage_image("new.png", png_bytes()).unwrap();
        assert!(matches!(
            session.stage_image("over.png", png_bytes()),
            Err(ValidationError::QuotaExceeded { staged: 4, max: 4, .. })
        ));

        assert!(session.remove_existing_image(0));
        session.stage_image("fits-now.png", png_bytes()).unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_content() {
        let session = EditorSession::new(EditorMode::Post);
        assert!(session.validate().is_err());

        let mut with_text = EditorSession::new(EditorMode::Post);
        with_text.insert_text("hi");
        assert!(with_text.validate().is_ok());

        let mut with_image = EditorSession::new(EditorMode::Post);
        with_image.stage_image("a.png", png_bytes()).unwrap();
        assert!(with_image.validate().is_ok());
    }

    #[test]
    fn test_submission_and_hydrate_round_trip() {
        let mut session = EditorSession::new(EditorMode::Post);
        session.insert_text("hello ");
        session.toggle_format(TextFormat::BOLD);
        session.insert_text("world");

        let submission = session.submission(vec!["memory://files/1/a.png".to_owned()]);
        assert_eq!(submission.plain_text, "hello world");
        assert_eq!(
            submission.rendered_html.as_deref(),
            Some("<p>hello <strong>world</strong></p>")
        );

        let rehydrated = EditorSession::hydrate(EditorMode::Post, &submission);
        assert_eq!(rehydrated.document(), session.document());
        assert_eq!(rehydrated.existing_images().len(), 1);
    }

    #[test]
    fn test_empty_session_produces_empty_submission() {
        let session = EditorSession::new(EditorMode::Post);
        let submission = session.submission(vec![]);
        assert_eq!(submission.document_tree, None);
        assert_eq!(submission.rendered_html, None);
        assert_eq!(submission.plain_text, "");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = EditorSession::new(EditorMode::Post);
        session.insert_text("text");
        session.stage_image("a.png", png_bytes()).unwrap();
        session.toggle_format(TextFormat::ITALIC);

        session.reset();
        assert!(session.document().is_empty());
        assert!(session.batch().is_empty());
        assert_eq!(session.pending_format(), TextFormat::empty());
        assert!(session.last_edit_at().is_none());
    }
}
