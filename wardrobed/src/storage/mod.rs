//! Blob store: durable object storage for uploaded and derived images.
//!
//! Handlers write originals and derived images through the [`BlobStore`]
//! trait, addressed by path. Paths are namespaced by owner id as the first
//! segment (see [`object_path`]) and public URLs are resolvable without
//! credentials. Two backends:
//!
//! - [`HttpBlobStore`]: a remote object-storage service speaking a
//!   Supabase-storage-style REST API
//! - [`MemoryBlobStore`]: in-process, for tests and local development

mod http;
mod memory;

pub use http::HttpBlobStore;
pub use memory::MemoryBlobStore;

use crate::config::StorageConfig;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

/// Blob store operation errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Writing a blob failed; nothing was persisted
    #[error("blob upload to {path} failed: {message}")]
    Upload { path: String, message: String },

    /// Deleting a blob failed; the blob may still exist
    #[error("blob delete of {path} failed: {message}")]
    Delete { path: String, message: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type alias for blob store operation results
pub type Result<T> = std::result::Result<T, StorageError>;

/// A blob written by a handler: its path in the store plus the resolved public URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub path: String,
    pub url: String,
}

/// Trait for blob store backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write bytes at `path` with the given content type
    async fn upload(&self, path: &str, content_type: &str, bytes: Bytes) -> Result<()>;

    /// Resolve the public, credential-free URL for `path`
    fn public_url(&self, path: &str) -> String;

    /// Delete the blob at `path`; deleting an absent path is not an error
    async fn delete(&self, path: &str) -> Result<()>;

    /// Map a public URL produced by this store back to its blob path.
    /// Returns `None` for URLs this store did not produce.
    fn blob_path(&self, url: &str) -> Option<String>;
}

/// Build a unique blob path: `{owner}/{unix_millis}-{token}.{ext}`.
///
/// The owner id is the first path segment, which keeps storage listings
/// isolated per owner. The extension comes from the original filename,
/// lowercased, defaulting to `jpg` when the filename has none.
pub fn object_path(owner: &str, original_filename: &str) -> String {
    let ext = std::path::Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "jpg".to_string());
    let millis = chrono::Utc::now().timestamp_millis();
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("{owner}/{millis}-{}.{ext}", &token[..8])
}

/// Create a blob store backend from configuration
pub fn create_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config {
        StorageConfig::Http {
            base_url,
            bucket,
            service_key,
            timeout,
        } => {
            tracing::info!("Creating HTTP blob store (bucket: {bucket})");
            let store = HttpBlobStore::new(base_url.clone(), bucket.clone(), service_key.clone(), *timeout)?;
            Ok(Arc::new(store))
        }
        StorageConfig::Memory { public_base } => {
            tracing::info!("Creating in-memory blob store");
            Ok(Arc::new(MemoryBlobStore::new(public_base.clone())))
        }
    }
}
