//! Upload staging and orchestration.
//!
//! Validation happens synchronously, before any service call. Compression is
//! sequential so a running savings aggregate can be reported per file. The
//! storage hand-off is one batch call: either every file gets a URL, in
//! input order, or none do.

use bytes::Bytes;
use miette::Diagnostic;
use mime_sniffer::MimeTypeSniffer;
use smol_str::SmolStr;
use thrum_common::{FilePayload, FileStore, StoreError};

use crate::compress::CompressionPipeline;
use crate::profile::CompressionRequest;

/// Per-file upload ceiling.
pub const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Accepted image types, by sniffed MIME.
pub const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Rejections reported to the user before anything leaves the process.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ValidationError {
    #[error("file #{index} is {size} bytes, over the {limit} byte limit")]
    TooLarge { index: usize, size: u64, limit: u64 },

    #[error("file #{index} has unsupported type {mime}")]
    UnsupportedType { index: usize, mime: String },

    #[error("adding {requested} file(s) to {staged} staged would exceed the limit of {max}")]
    QuotaExceeded {
        staged: usize,
        requested: usize,
        max: usize,
    },
}

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

fn sniff_mime(data: &Bytes) -> SmolStr {
    SmolStr::new(data.sniff_mime_type().unwrap_or("application/octet-stream"))
}

fn validate_file(index: usize, data: &Bytes) -> Result<SmolStr, ValidationError> {
    let size = data.len() as u64;
    if size > MAX_FILE_BYTES {
        return Err(ValidationError::TooLarge {
            index,
            size,
            limit: MAX_FILE_BYTES,
        });
    }
    let mime = sniff_mime(data);
    if !ALLOWED_TYPES.contains(&mime.as_str()) {
        return Err(ValidationError::UnsupportedType {
            index,
            mime: mime.to_string(),
        });
    }
    Ok(mime)
}

/// The ordered set of images staged in one editing session.
///
/// Created empty when an editor mounts, grows through user selection, shrinks
/// through explicit removal, and is cleared (not dropped) on submit or
/// cancel.
#[derive(Debug)]
pub struct UploadBatch {
    files: Vec<FilePayload>,
    max: usize,
}

impl UploadBatch {
    pub fn new(max: usize) -> Self {
        Self {
            files: Vec::new(),
            max,
        }
    }

    /// Validate and append one file.
    pub fn stage(&mut self, name: &str, data: Bytes) -> Result<(), ValidationError> {
        if self.files.len() + 1 > self.max {
            return Err(ValidationError::QuotaExceeded {
                staged: self.files.len(),
                requested: 1,
                max: self.max,
            });
        }
        let mime = validate_file(self.files.len(), &data)?;
        self.files.push(FilePayload::new(name, mime, data));
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<FilePayload> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[FilePayload] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

/// Running aggregate reported after each file is compressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadProgress {
    pub processed: usize,
    pub total: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl UploadProgress {
    pub fn percent_done(&self) -> u8 {
        if self.total == 0 {
            100
        } else {
            (self.processed * 100 / self.total) as u8
        }
    }

    pub fn percent_saved(&self) -> u8 {
        if self.bytes_before == 0 || self.bytes_after >= self.bytes_before {
            0
        } else {
            (100.0 * (1.0 - self.bytes_after as f64 / self.bytes_before as f64)).round() as u8
        }
    }
}

/// Compress and store a batch of files, returning one URL per file in input
/// order.
///
/// Fails fast on quota and per-file validation before any compression or
/// service call; a single invalid member rejects the whole batch. A
/// compression failure is soft (the original bytes are uploaded); a storage
/// failure aborts the batch with no partial result.
pub async fn upload_batch<S: FileStore + Sync>(
    store: &S,
    pipeline: &CompressionPipeline,
    files: &[FilePayload],
    current_count: usize,
    max_images: usize,
    request: &CompressionRequest,
    mut on_progress: impl FnMut(&UploadProgress),
) -> Result<Vec<String>, UploadError> {
    if current_count + files.len() > max_images {
        return Err(ValidationError::QuotaExceeded {
            staged: current_count,
            requested: files.len(),
            max: max_images,
        }
        .into());
    }

    for (index, file) in files.iter().enumerate() {
        validate_file(index, &file.data)?;
    }

    let mut progress = UploadProgress {
        total: files.len(),
        ..UploadProgress::default()
    };
    let mut outgoing = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let result = pipeline.compress(&file.data, request);
        if !result.success {
            tracing::warn!(
                index,
                name = %file.name,
                error = result.error.as_deref().unwrap_or("unknown"),
                "compression failed, uploading original"
            );
        }
        progress.processed += 1;
        progress.bytes_before += result.original_size as u64;
        progress.bytes_after += result.compressed_size as u64;
        tracing::debug!(
            index,
            name = %file.name,
            percent_done = progress.percent_done(),
            percent_saved = progress.percent_saved(),
            "compressed"
        );
        on_progress(&progress);

        let mime = sniff_mime(&result.data);
        outgoing.push(FilePayload::new(file.name.clone(), mime, result.data));
    }

    let urls = store.store_batch(outgoing).await?;
    if urls.len() != files.len() {
        return Err(StoreError::Unavailable(format!(
            "storage returned {} urls for {} files",
            urls.len(),
            files.len()
        ))
        .into());
    }
    Ok(urls)
}
