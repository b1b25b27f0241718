use super::{BlobStore, Result, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use url::Url;

/// Blob store backend speaking a Supabase-storage-style object REST API.
///
/// - write: `POST {base}/object/{bucket}/{path}` with a bearer service key
/// - delete: `DELETE {base}/object/{bucket}/{path}`
/// - public URL: `{base}/object/public/{bucket}/{path}` (bucket is public-read)
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: Option<String>,
}

impl HttpBlobStore {
    pub fn new(base_url: Url, bucket: String, service_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Other(anyhow::anyhow!("failed to build storage HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            bucket,
            service_key,
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, self.bucket, path)
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.service_key {
            Some(key) => request.header(AUTHORIZATION, format!("Bearer {key}")),
            None => request,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, path: &str, content_type: &str, bytes: Bytes) -> Result<()> {
        let response = self
            .with_auth(self.client.post(self.object_url(path)))
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Upload {
                path: path.to_string(),
                message: format!("storage service returned {status}: {body}"),
            });
        }

        tracing::debug!(path, "uploaded blob");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, path)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .with_auth(self.client.delete(self.object_url(path)))
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        // The storage API reports deleting an absent object as not-found; treat
        // it like a successful delete so cleanup stays idempotent.
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Delete {
                path: path.to_string(),
                message: format!("storage service returned {status}: {body}"),
            });
        }

        tracing::debug!(path, "deleted blob");
        Ok(())
    }

    fn blob_path(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/object/public/{}/", self.base_url, self.bucket);
        url.strip_prefix(prefix.as_str()).map(|path| path.to_string())
    }
}
