//! The submit flow: validate, resolve the actor, upload the staged batch,
//! hand the submission to the persistence service, reset the session.
//!
//! Uploads are fire-and-forget past the single batch call; atomicity is at
//! request granularity, so a failure leaves no partial URL list behind.

use miette::Diagnostic;
use thrum_common::{AuthService, FileStore, RecordId, RecordStore, StoreError};
use thrum_media::{CompressionPipeline, UploadError, upload_batch};

use crate::session::EditorSession;

/// Result of a publish operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishResult {
    /// Record was created (new)
    Created(RecordId),
    /// Record was updated (existing)
    Updated(RecordId),
}

impl PublishResult {
    pub fn id(&self) -> RecordId {
        match self {
            PublishResult::Created(id) | PublishResult::Updated(id) => *id,
        }
    }
}

/// Failures of the submit flow.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum SubmitError {
    /// Nothing to submit: empty document and empty image batch.
    #[error("nothing to submit: no text content and no images")]
    EmptyContent,

    /// The auth service reports no signed-in actor.
    #[error("no signed-in actor")]
    NotAuthenticated,

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Publish the session as a post. `target` selects create vs. update.
///
/// On success the session resets; on failure it is left intact so the user
/// can retry by resubmitting.
pub async fn publish_post<A, F, R>(
    session: &mut EditorSession,
    auth: &A,
    files: &F,
    records: &R,
    pipeline: &CompressionPipeline,
    target: Option<RecordId>,
) -> Result<PublishResult, SubmitError>
where
    A: AuthService + Sync,
    F: FileStore + Sync,
    R: RecordStore + Sync,
{
    session.validate()?;
    let actor = auth
        .current_actor()
        .await
        .ok_or(SubmitError::NotAuthenticated)?;

    let image_urls = upload_session_images(session, files, pipeline).await?;
    let submission = session.submission(image_urls);

    let result = match target {
        None => {
            let record = records.create_post(&actor, submission).await?;
            PublishResult::Created(record.id)
        }
        Some(id) => {
            let record = records.update_post(id, &actor, submission).await?;
            PublishResult::Updated(record.id)
        }
    };

    tracing::debug!(id = %result.id(), actor = %actor.id, "published post");
    session.reset();
    Ok(result)
}

/// Publish the session as a comment on `post_id`, optionally threaded under
/// `parent_id`. `target` selects create vs. update.
pub async fn publish_comment<A, F, R>(
    session: &mut EditorSession,
    auth: &A,
    files: &F,
    records: &R,
    pipeline: &CompressionPipeline,
    post_id: RecordId,
    parent_id: Option<RecordId>,
    target: Option<RecordId>,
) -> Result<PublishResult, SubmitError>
where
    A: AuthService + Sync,
    F: FileStore + Sync,
    R: RecordStore + Sync,
{
    session.validate()?;
    let actor = auth
        .current_actor()
        .await
        .ok_or(SubmitError::NotAuthenticated)?;

    let image_urls = upload_session_images(session, files, pipeline).await?;
    let submission = session.submission(image_urls);

    let result = match target {
        None => {
            let record = records
                .create_comment(&actor, post_id, parent_id, submission)
                .await?;
            PublishResult::Created(record.id)
        }
        Some(id) => {
            let record = records.update_comment(id, &actor, submission).await?;
            PublishResult::Updated(record.id)
        }
    };

    tracing::debug!(id = %result.id(), actor = %actor.id, %post_id, "published comment");
    session.reset();
    Ok(result)
}

/// Upload the staged batch and splice the resulting URLs after the
/// already-persisted ones.
async fn upload_session_images<F>(
    session: &EditorSession,
    files: &F,
    pipeline: &CompressionPipeline,
) -> Result<Vec<String>, UploadError>
where
    F: FileStore + Sync,
{
    let mut urls = session.existing_images().to_vec();
    if session.batch().is_empty() {
        return Ok(urls);
    }
    let uploaded = upload_batch(
        files,
        pipeline,
        session.batch().files(),
        urls.len(),
        session.max_images(),
        session.compression(),
        |progress| {
            tracing::debug!(
                processed = progress.processed,
                total = progress.total,
                percent_saved = progress.percent_saved(),
                "upload progress"
            );
        },
    )
    .await?;
    urls.extend(uploaded);
    Ok(urls)
}
