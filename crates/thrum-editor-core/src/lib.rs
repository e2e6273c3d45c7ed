//! thrum-editor-core: framework-free editing sessions.
//!
//! This crate provides:
//! - `EditorSession` - one rich-content editing session owning its document
//!   tree and staged image batch
//! - `EditorAction` - semantic editing operations, decoupled from how
//!   they're triggered
//! - `Composition` - the IME state machine gating text-mutation side effects
//! - `autolink` - URL detection over settled text
//! - `publish` - the submit flow against the service seams

pub mod actions;
pub mod autolink;
pub mod publish;
pub mod session;
pub mod types;

pub use actions::EditorAction;
pub use publish::{PublishResult, SubmitError, publish_comment, publish_post};
pub use session::{ChangeListener, EditorSession};
pub use types::{Composition, EditorMode};
