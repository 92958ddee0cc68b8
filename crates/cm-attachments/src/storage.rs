//! Storage Abstraction
//!
//! Provides a unified interface over blob-storage backends. A backend stores
//! named blobs inside per-owner namespaces and hands back a stable reference
//! path that can later be resolved for read or mapped to a public URL.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Attachment not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },
    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage trait - unified interface for blob-storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create the per-owner namespace if it does not exist yet
    async fn ensure_namespace(&self, namespace: &str) -> StorageResult<()>;

    /// Durably write a blob under `namespace/name`, returning its stable
    /// reference path
    async fn put(&self, namespace: &str, name: &str, data: Bytes) -> StorageResult<String>;

    /// Resolve a previously returned reference path
    async fn get(&self, reference: &str) -> StorageResult<Bytes>;

    /// Remove a blob by reference path; removing an absent blob is not an
    /// error
    async fn delete(&self, reference: &str) -> StorageResult<()>;

    /// Map a reference path to the URL it is served under
    fn url(&self, reference: &str) -> String;

    /// Backend name for logging
    fn name(&self) -> &str;
}

fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty()
        || key.contains("..")
        || key.starts_with('/')
        || key.starts_with('\\')
        || key.contains('\0')
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Local filesystem storage
///
/// Blobs live under `root/<namespace>/<name>`; the reference path is the
/// `namespace/name` part, so references stay valid if the root moves.
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl AsRef<Path>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            base_url: base_url.into(),
        }
    }

    /// Create storage rooted in a temp directory
    pub fn temp() -> std::io::Result<Self> {
        let dir = std::env::temp_dir().join("carmart-attachments");
        std::fs::create_dir_all(&dir)?;
        Ok(Self::new(dir, "/uploads"))
    }

    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    #[instrument(skip(self), fields(storage = "local"))]
    async fn ensure_namespace(&self, namespace: &str) -> StorageResult<()> {
        let path = self.resolve(namespace)?;
        fs::create_dir_all(&path).await?;
        Ok(())
    }

    #[instrument(skip(self, data), fields(storage = "local", size = data.len()))]
    async fn put(&self, namespace: &str, name: &str, data: Bytes) -> StorageResult<String> {
        validate_key(namespace)?;
        validate_key(name)?;
        let reference = format!("{}/{}", namespace, name);
        let path = self.root.join(&reference);

        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;

        debug!(path = ?path, "attachment stored");
        Ok(reference)
    }

    #[instrument(skip(self), fields(storage = "local"))]
    async fn get(&self, reference: &str) -> StorageResult<Bytes> {
        let path = self.resolve(reference)?;
        if !path.exists() {
            return Err(StorageError::NotFound(reference.to_string()));
        }
        let data = fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    #[instrument(skip(self), fields(storage = "local"))]
    async fn delete(&self, reference: &str) -> StorageResult<()> {
        let path = self.resolve(reference)?;
        if path.exists() {
            fs::remove_file(&path).await?;
            debug!(path = ?path, "attachment deleted");
        }
        Ok(())
    }

    fn url(&self, reference: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), reference)
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// In-memory storage for testing
///
/// Optionally enforces a write budget so tests can force a failure in the
/// middle of a multi-file batch.
pub struct MemoryStorage {
    files: tokio::sync::RwLock<HashMap<String, Bytes>>,
    namespaces: tokio::sync::RwLock<HashSet<String>>,
    remaining_writes: Option<AtomicUsize>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            files: tokio::sync::RwLock::new(HashMap::new()),
            namespaces: tokio::sync::RwLock::new(HashSet::new()),
            remaining_writes: None,
        }
    }

    /// Storage that accepts `budget` writes and rejects every one after
    pub fn with_write_budget(budget: usize) -> Self {
        Self {
            remaining_writes: Some(AtomicUsize::new(budget)),
            ..Self::new()
        }
    }

    /// Number of blobs currently held
    pub async fn stored_count(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ensure_namespace(&self, namespace: &str) -> StorageResult<()> {
        validate_key(namespace)?;
        self.namespaces.write().await.insert(namespace.to_string());
        Ok(())
    }

    async fn put(&self, namespace: &str, name: &str, data: Bytes) -> StorageResult<String> {
        validate_key(namespace)?;
        validate_key(name)?;

        if let Some(remaining) = &self.remaining_writes {
            if remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err()
            {
                return Err(StorageError::Backend("write budget exhausted".to_string()));
            }
        }

        let reference = format!("{}/{}", namespace, name);
        self.files.write().await.insert(reference.clone(), data);
        Ok(reference)
    }

    async fn get(&self, reference: &str) -> StorageResult<Bytes> {
        self.files
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(reference.to_string()))
    }

    async fn delete(&self, reference: &str) -> StorageResult<()> {
        self.files.write().await.remove(reference);
        Ok(())
    }

    fn url(&self, reference: &str) -> String {
        format!("/memory/{}", reference)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
