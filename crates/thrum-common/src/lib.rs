//! thrum-common: shared types and service seams for the content pipeline.
//!
//! This crate provides:
//! - `Submission` - the boundary artifact handed to the persistence service
//! - `RecordStore` / `AuthService` / `FileStore` - async service traits
//! - `MemoryRecordStore` / `MemoryFileStore` - in-process reference stores
//! - `Config` - editor limits with pluggable load/save
//! - `StoreError` - the storage-facing error type

pub mod config;
pub mod error;
pub mod memory;
pub mod record;
pub mod services;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use config::{Config, Loader, Saver};
pub use error::StoreError;
pub use memory::{MemoryFileStore, MemoryRecordStore, StaticAuth};
pub use record::{Actor, CommentRecord, FilePayload, PostRecord, RecordId, Submission};
pub use services::{AuthService, FileStore, RecordStore};
