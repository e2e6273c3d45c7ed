//! In-process reference implementations of the service traits.
//!
//! Used for local development and tests. Not durable: everything lives in
//! maps behind async locks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::record::{Actor, CommentRecord, FilePayload, PostRecord, RecordId, Submission};
use crate::services::{AuthService, FileStore, RecordStore};

/// Auth service with a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    actor: Option<Actor>,
}

impl StaticAuth {
    pub fn signed_in(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    pub fn signed_out() -> Self {
        Self { actor: None }
    }
}

impl AuthService for StaticAuth {
    async fn current_actor(&self) -> Option<Actor> {
        self.actor.clone()
    }
}

/// Map-backed persistence service.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    next_id: AtomicU64,
    posts: RwLock<HashMap<RecordId, PostRecord>>,
    comments: RwLock<HashMap<RecordId, CommentRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> RecordId {
        RecordId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub async fn post(&self, id: RecordId) -> Option<PostRecord> {
        self.posts.read().await.get(&id).cloned()
    }

    pub async fn comment(&self, id: RecordId) -> Option<CommentRecord> {
        self.comments.read().await.get(&id).cloned()
    }
}

impl RecordStore for MemoryRecordStore {
    async fn create_post(
        &self,
        author: &Actor,
        content: Submission,
    ) -> Result<PostRecord, StoreError> {
        let record = PostRecord {
            id: self.next_id(),
            author: author.id.clone(),
            content,
            created_at: Utc::now(),
            edited_at: None,
        };
        self.posts.write().await.insert(record.id, record.clone());
        tracing::debug!(id = %record.id, author = %record.author, "created post");
        Ok(record)
    }

    async fn update_post(
        &self,
        id: RecordId,
        actor: &Actor,
        content: Submission,
    ) -> Result<PostRecord, StoreError> {
        let mut posts = self.posts.write().await;
        let record = posts
            .get_mut(&id)
            .filter(|r| r.author == actor.id)
            .ok_or(StoreError::NotFoundOrUnauthorized)?;
        record.content = content;
        record.edited_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn delete_post(&self, id: RecordId, actor: &Actor) -> Result<(), StoreError> {
        let mut posts = self.posts.write().await;
        match posts.get(&id) {
            Some(r) if r.author == actor.id => {
                posts.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::NotFoundOrUnauthorized),
        }
    }

    async fn create_comment(
        &self,
        author: &Actor,
        post_id: RecordId,
        parent_id: Option<RecordId>,
        content: Submission,
    ) -> Result<CommentRecord, StoreError> {
        if !self.posts.read().await.contains_key(&post_id) {
            return Err(StoreError::NotFoundOrUnauthorized);
        }
        let record = CommentRecord {
            id: self.next_id(),
            post_id,
            parent_id,
            author: author.id.clone(),
            content,
            created_at: Utc::now(),
            edited_at: None,
        };
        self.comments
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_comment(
        &self,
        id: RecordId,
        actor: &Actor,
        content: Submission,
    ) -> Result<CommentRecord, StoreError> {
        let mut comments = self.comments.write().await;
        let record = comments
            .get_mut(&id)
            .filter(|r| r.author == actor.id)
            .ok_or(StoreError::NotFoundOrUnauthorized)?;
        record.content = content;
        record.edited_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn delete_comment(&self, id: RecordId, actor: &Actor) -> Result<(), StoreError> {
        let mut comments = self.comments.write().await;
        match comments.get(&id) {
            Some(r) if r.author == actor.id => {
                comments.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::NotFoundOrUnauthorized),
        }
    }
}

/// Map-backed file storage with `memory://` URLs.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    next_id: AtomicU64,
    files: RwLock<HashMap<String, FilePayload>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    async fn store_one(&self, file: FilePayload) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let url = format!("memory://files/{}/{}", id, file.name);
        self.files.write().await.insert(url.clone(), file);
        url
    }
}

impl FileStore for MemoryFileStore {
    async fn store(&self, file: FilePayload) -> Result<String, StoreError> {
        Ok(self.store_one(file).await)
    }

    async fn store_batch(&self, files: Vec<FilePayload>) -> Result<Vec<String>, StoreError> {
        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            urls.push(self.store_one(file).await);
        }
        Ok(urls)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, StoreError> {
        self.files
            .read()
            .await
            .get(url)
            .map(|f| f.data.clone())
            .ok_or(StoreError::NotFoundOrUnauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(text: &str) -> Submission {
        Submission {
            document_tree: None,
            rendered_html: None,
            plain_text: text.to_owned(),
            image_urls: vec![],
        }
    }

    #[tokio::test]
    async fn test_post_lifecycle() {
        let store = MemoryRecordStore::new();
        let alice = Actor::new("alice", "Alice");

        let post = store
            .create_post(&alice, submission("first"))
            .await
            .unwrap();
        assert_eq!(store.post(post.id).await.unwrap().content.plain_text, "first");

        let updated = store
            .update_post(post.id, &alice, submission("edited"))
            .await
            .unwrap();
        assert!(updated.edited_at.is_some());

        store.delete_post(post.id, &alice).await.unwrap();
        assert!(store.post(post.id).await.is_none());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_update_or_delete() {
        let store = MemoryRecordStore::new();
        let alice = Actor::new("alice", "Alice");
        let mallory = Actor::new("mallory", "Mallory");

        let post = store.create_post(&alice, submission("mine")).await.unwrap();

        assert!(matches!(
            store.update_post(post.id, &mallory, submission("!")).await,
            Err(StoreError::NotFoundOrUnauthorized)
        ));
        assert!(matches!(
            store.delete_post(post.id, &mallory).await,
            Err(StoreError::NotFoundOrUnauthorized)
        ));
        assert!(store.post(post.id).await.is_some());
    }

    #[tokio::test]
    async fn test_comment_requires_existing_post() {
        let store = MemoryRecordStore::new();
        let alice = Actor::new("alice", "Alice");

        assert!(matches!(
            store
                .create_comment(&alice, RecordId(999), None, submission("?"))
                .await,
            Err(StoreError::NotFoundOrUnauthorized)
        ));

        let post = store.create_post(&alice, submission("post")).await.unwrap();
        let comment = store
            .create_comment(&alice, post.id, None, submission("reply"))
            .await
            .unwrap();
        let nested = store
            .create_comment(&alice, post.id, Some(comment.id), submission("nested"))
            .await
            .unwrap();
        assert_eq!(nested.parent_id, Some(comment.id));
    }

    #[tokio::test]
    async fn test_file_store_batch_preserves_order() {
        let store = MemoryFileStore::new();
        let files: Vec<FilePayload> = (0..3)
            .map(|i| {
                FilePayload::new(
                    format!("img{i}.jpg"),
                    "image/jpeg",
                    Bytes::from(vec![i as u8; 4]),
                )
            })
            .collect();

        let urls = store.store_batch(files).await.unwrap();
        assert_eq!(urls.len(), 3);
        for (i, url) in urls.iter().enumerate() {
            assert!(url.ends_with(&format!("img{i}.jpg")));
            assert_eq!(store.fetch(url).await.unwrap(), Bytes::from(vec![i as u8; 4]));
        }
    }

    #[tokio::test]
    async fn test_fetch_unknown_url() {
        let store = MemoryFileStore::new();
        assert!(matches!(
            store.fetch("memory://files/1/missing.png").await,
            Err(StoreError::NotFoundOrUnauthorized)
        ));
    }
}
