//! Semantic editor actions.
//!
//! These represent operations on the document, decoupled from how they're
//! triggered (toolbar button, key chord, input event, paste). The session's
//! `apply` is the single dispatch point.

use thrum_document::TextFormat;

/// All editor operations a session accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    /// Insert settled text at the end of the document.
    Insert { text: String },

    /// Start a new paragraph (Enter).
    InsertParagraph,

    /// Insert a hard line break within the paragraph (Shift+Enter).
    InsertLineBreak,

    /// Toggle format bits for subsequently inserted text.
    ToggleFormat { format: TextFormat },

    /// IME composition started.
    BeginComposition,

    /// IME preview text changed (uncommitted).
    UpdateComposition { text: String },

    /// IME composition committed with its final text.
    EndComposition { text: String },

    /// IME composition abandoned.
    CancelComposition,
}

impl EditorAction {
    /// Whether this action is part of an IME composition exchange.
    pub fn is_composition(&self) -> bool {
        matches!(
            self,
            Self::BeginComposition
                | Self::UpdateComposition { .. }
                | Self::EndComposition { .. }
                | Self::CancelComposition
        )
    }
}
