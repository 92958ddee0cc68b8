//! # cm-attachments
//!
//! Attachment ingestion for CarMart RS.
//!
//! Uploaded files are written into a per-owner storage namespace under
//! collision-resistant generated names, and each write yields a stable
//! reference path that listing records carry from then on.
//!
//! ## Features
//!
//! - Storage abstraction (local filesystem, in-memory for tests)
//! - Whole-batch ingestion: a single failed write fails the request and
//!   discards the partial batch
//! - Monotonic name generation that survives same-millisecond uploads

pub mod ingest;
pub mod storage;

pub use ingest::{AttachmentIngestor, UploadedFile};
pub use storage::{LocalStorage, MemoryStorage, Storage, StorageError, StorageResult};
