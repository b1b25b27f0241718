//! Shared plumbing for moving image bytes between services.

use bytes::Bytes;

use crate::errors::{Error, Result};
use crate::storage::{BlobStore, StoredImage};

/// Fetch an image over HTTP.
///
/// Any transport failure or non-success status is a hard error; there is no
/// fallback for a URL that does not resolve. The origin's content type is
/// passed through when it names one.
pub async fn fetch_image(client: &reqwest::Client, url: &str) -> Result<(Bytes, Option<String>)> {
    let response = client.get(url).send().await.map_err(|e| Error::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Fetch {
            url: url.to_string(),
            reason: format!("origin returned {status}"),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let bytes = response.bytes().await.map_err(|e| Error::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok((bytes, content_type))
}

/// Compensating delete for a blob written earlier in a request that has
/// since failed. The delete's own failure is logged and swallowed; the
/// caller's original error is the one the client sees.
pub async fn discard_blob(blobs: &dyn BlobStore, stored: &StoredImage) {
    match blobs.delete(&stored.path).await {
        Ok(()) => {
            tracing::info!(path = %stored.path, "rolled back stored blob after persistence failure");
        }
        Err(e) => {
            tracing::warn!(path = %stored.path, error = %e, "failed to roll back stored blob");
        }
    }
}

/// File extension for a source URL. A `png`, `webp`, or `gif` suffix is
/// kept; anything else, including no suffix at all, becomes `jpg`.
pub fn extension_from_url(url: &str) -> &'static str {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    match trimmed.rsplit('.').next().map(|ext| ext.to_ascii_lowercase()).as_deref() {
        Some("png") => "png",
        Some("webp") => "webp",
        Some("gif") => "gif",
        _ => "jpg",
    }
}
