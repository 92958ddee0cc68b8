//! Attachment Ingestor
//!
//! Turns the raw files of a single create/update request into durable blobs
//! inside the owner's storage namespace. The batch either lands completely
//! or not at all: on the first failed write the already-written files of the
//! batch are discarded and the error is returned before any listing record
//! is touched.

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use cm_core::Id;
use tracing::{info, instrument, warn};

use crate::storage::{Storage, StorageError, StorageResult};

/// A raw uploaded file as received from the transport layer
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original client-side filename
    pub filename: String,
    /// MIME type as declared by the client, or guessed from the filename
    pub content_type: String,
    /// File content
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, data: Bytes) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string();
        Self {
            filename,
            content_type,
            data,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Ingests uploaded files into per-owner namespaces
///
/// One ingestor instance is shared by all in-flight requests; the name
/// generator is an atomic high-water mark over millisecond timestamps, so
/// two uploads can never be assigned the same destination name even when
/// they arrive within the same clock tick.
pub struct AttachmentIngestor {
    storage: Arc<dyn Storage>,
    max_file_size: usize,
    last_token: AtomicI64,
}

impl AttachmentIngestor {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            max_file_size: 20 * 1024 * 1024,
            last_token: AtomicI64::new(0),
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Write every file of the request into the owner's namespace and return
    /// the reference paths in input order.
    ///
    /// Fails as a whole: a rejected or failed write discards the files
    /// already written for this batch and returns the error, so a listing
    /// record can never reference attachments that did not land.
    #[instrument(skip(self, files), fields(storage = self.storage.name(), count = files.len()))]
    pub async fn ingest(&self, owner: Id, files: Vec<UploadedFile>) -> StorageResult<Vec<String>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        for file in &files {
            if file.data.len() > self.max_file_size {
                return Err(StorageError::TooLarge {
                    size: file.data.len(),
                    max: self.max_file_size,
                });
            }
        }

        let namespace = owner.to_string();
        self.storage.ensure_namespace(&namespace).await?;

        let mut references = Vec::with_capacity(files.len());
        for file in files {
            let name = self.next_name(&file.filename);
            match self.storage.put(&namespace, &name, file.data).await {
                Ok(reference) => references.push(reference),
                Err(err) => {
                    self.discard(&references).await;
                    return Err(err);
                }
            }
        }

        info!(owner, count = references.len(), "attachments ingested");
        Ok(references)
    }

    /// Best-effort removal of a partially written batch. The original write
    /// error stays authoritative; cleanup failures are only logged.
    async fn discard(&self, references: &[String]) {
        for reference in references {
            if let Err(err) = self.storage.delete(reference).await {
                warn!(reference = %reference, error = %err, "failed to discard attachment from aborted batch");
            }
        }
    }

    /// Generate a destination name from the current millisecond timestamp,
    /// keeping the original extension. The token is forced strictly above
    /// the last issued one, which disambiguates same-millisecond uploads and
    /// tolerates a clock stepping backwards.
    fn next_name(&self, filename: &str) -> String {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last_token.load(Ordering::SeqCst);
        let token = loop {
            let candidate = now.max(prev + 1);
            match self.last_token.compare_exchange(
                prev,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break candidate,
                Err(actual) => prev = actual,
            }
        };

        match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() => format!("{}.{}", token, ext),
            _ => token.to_string(),
        }
    }
}
