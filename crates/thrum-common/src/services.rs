//! Async service traits consumed by the content pipeline.
//!
//! These are in-process seams, not wire protocols: routing, ORM behavior,
//! and auth mechanics live behind them. Each trait has a `Local*` base
//! variant and a `Send` variant generated by `trait_variant` for use across
//! task boundaries.

use bytes::Bytes;

use crate::error::StoreError;
use crate::record::{Actor, CommentRecord, FilePayload, PostRecord, RecordId, Submission};

/// Persistence service for posts and comments.
///
/// Deletes and updates fail with [`StoreError::NotFoundOrUnauthorized`] when
/// the actor is not the record's owner.
#[trait_variant::make(RecordStore: Send)]
pub trait LocalRecordStore {
    async fn create_post(&self, author: &Actor, content: Submission)
    -> Result<PostRecord, StoreError>;

    async fn update_post(
        &self,
        id: RecordId,
        actor: &Actor,
        content: Submission,
    ) -> Result<PostRecord, StoreError>;

    async fn delete_post(&self, id: RecordId, actor: &Actor) -> Result<(), StoreError>;

    async fn create_comment(
        &self,
        author: &Actor,
        post_id: RecordId,
        parent_id: Option<RecordId>,
        content: Submission,
    ) -> Result<CommentRecord, StoreError>;

    async fn update_comment(
        &self,
        id: RecordId,
        actor: &Actor,
        content: Submission,
    ) -> Result<CommentRecord, StoreError>;

    async fn delete_comment(&self, id: RecordId, actor: &Actor) -> Result<(), StoreError>;
}

/// Identifies the current actor, if any.
#[trait_variant::make(AuthService: Send)]
pub trait LocalAuthService {
    async fn current_actor(&self) -> Option<Actor>;
}

/// Binary file storage.
#[trait_variant::make(FileStore: Send)]
pub trait LocalFileStore {
    /// Persist one file, returning its URL.
    async fn store(&self, file: FilePayload) -> Result<String, StoreError>;

    /// Persist a batch in one request, returning one URL per input file in
    /// input order. All-or-nothing: a failure stores none of them.
    async fn store_batch(&self, files: Vec<FilePayload>) -> Result<Vec<String>, StoreError>;

    /// Read a stored file back.
    async fn fetch(&self, url: &str) -> Result<Bytes, StoreError>;
}
