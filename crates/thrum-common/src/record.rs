//! Records, actors, and the submission boundary artifact.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thrum_document::Document;

/// Identifier for a stored post or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The signed-in user, as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: SmolStr,
    pub display_name: String,
}

impl Actor {
    pub fn new(id: impl Into<SmolStr>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// The shape an editing session produces for storage, and re-hydrates from
/// when editing.
///
/// Once submitted, the tree is handed over by value; no shared mutable
/// reference survives the submit boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub document_tree: Option<Document>,
    pub rendered_html: Option<String>,
    pub plain_text: String,
    pub image_urls: Vec<String>,
}

/// A stored post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: RecordId,
    pub author: SmolStr,
    pub content: Submission,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// A stored comment or threaded reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: RecordId,
    pub post_id: RecordId,
    /// Parent comment when this is a threaded reply.
    pub parent_id: Option<RecordId>,
    pub author: SmolStr,
    pub content: Submission,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// An in-memory file: name, sniffed MIME type, raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePayload {
    pub name: SmolStr,
    pub mime: SmolStr,
    pub data: Bytes,
}

impl FilePayload {
    pub fn new(name: impl Into<SmolStr>, mime: impl Into<SmolStr>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
