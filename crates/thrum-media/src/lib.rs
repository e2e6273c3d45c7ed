//! thrum-media: image compression and upload batching.
//!
//! This crate provides:
//! - `CompressionRequest` / `Preset` - strategy selection, including the
//!   size-tiered "smart" mode
//! - `Compressor` - the strategy seam, with a codec-quality-ladder primary
//!   and a single-pass resize fallback
//! - `CompressionPipeline` - probe-selected strategies with a never-throws
//!   result boundary
//! - `UploadBatch` - the bounded per-session staging area
//! - `upload_batch` - sequential compress-then-store orchestration

pub mod compress;
pub mod profile;
pub mod upload;

pub use compress::{
    CodecCompressor, CompressError, CompressionPipeline, CompressionResult, Compressor,
    ResizeFallbackCompressor, fit_dimensions,
};
pub use profile::{CompressionConfig, CompressionRequest, OutputFormat, Preset};
pub use upload::{
    ALLOWED_TYPES, MAX_FILE_BYTES, UploadBatch, UploadError, UploadProgress, ValidationError,
    upload_batch,
};
