//! Editor session types: mode and composition state.

use thrum_common::Config;

/// What kind of record this session edits. Fixes the image quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Post,
    Comment,
    Reply,
}

impl EditorMode {
    /// Default image quota for this mode.
    pub fn max_images(self) -> usize {
        match self {
            Self::Post => 9,
            Self::Comment | Self::Reply => 4,
        }
    }

    /// Image quota under an explicit config.
    pub fn max_images_with(self, config: &Config) -> usize {
        match self {
            Self::Post => config.max_images_post,
            Self::Comment | Self::Reply => config.max_images_comment,
        }
    }
}

/// IME composition state (for international text input).
///
/// While composing, the user is building up a string that hasn't been
/// committed yet; text-mutation side effects such as link detection must not
/// run on it. The preview string is what the input method currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Composition {
    #[default]
    Idle,
    Composing {
        preview: String,
    },
}

impl Composition {
    pub fn is_composing(&self) -> bool {
        matches!(self, Self::Composing { .. })
    }

    /// The uncommitted preview text, if composing.
    pub fn preview(&self) -> Option<&str> {
        match self {
            Self::Composing { preview } => Some(preview),
            Self::Idle => None,
        }
    }
}
