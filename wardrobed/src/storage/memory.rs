use super::{BlobStore, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A blob held by the in-memory store
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub content_type: String,
    pub bytes: Bytes,
}

/// In-memory blob store backend
/// Useful for development and testing; also records delete calls so tests can
/// assert cleanup behavior.
pub struct MemoryBlobStore {
    public_base: String,
    blobs: RwLock<HashMap<String, StoredBlob>>,
    deletes: RwLock<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new(public_base: impl Into<String>) -> Self {
        Self {
            public_base: public_base.into().trim_end_matches('/').to_string(),
            blobs: RwLock::new(HashMap::new()),
            deletes: RwLock::new(Vec::new()),
        }
    }

    /// Blob currently stored at `path`, if any
    pub fn contents(&self, path: &str) -> Option<StoredBlob> {
        self.blobs.read().get(path).cloned()
    }

    /// All stored paths, unordered
    pub fn paths(&self) -> Vec<String> {
        self.blobs.read().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Every path a delete was issued for, in call order
    pub fn delete_calls(&self) -> Vec<String> {
        self.deletes.read().clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, content_type: &str, bytes: Bytes) -> Result<()> {
        self.blobs.write().insert(
            path.to_string(),
            StoredBlob {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{path}", self.public_base)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.deletes.write().push(path.to_string());
        self.blobs.write().remove(path);
        Ok(())
    }

    fn blob_path(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.public_base);
        url.strip_prefix(prefix.as_str()).map(|path| path.to_string())
    }
}
