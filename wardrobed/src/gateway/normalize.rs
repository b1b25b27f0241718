//! Response normalizer.
//!
//! Inference endpoints return images in whatever shape the hosted model
//! happens to emit: absolute URL strings, data URIs, bare base64 payloads, or
//! objects carrying `url`/`path` fields. Everything downstream works on the
//! canonical [`ImageOutput`] produced here, so each handler applies the same
//! interpretation rules.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;
use thiserror::Error;

/// Label recorded when classification is unavailable or unparseable
pub const DEFAULT_CATEGORY: &str = "uncategorized";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unrecognized output shape: {detail}")]
    UnrecognizedShape { detail: String },
}

fn unrecognized(detail: impl Into<String>) -> NormalizeError {
    NormalizeError::UnrecognizedShape { detail: detail.into() }
}

/// One inference output in canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutput {
    /// A fetchable absolute URL
    Url(String),
    /// Image bytes decoded out of the payload itself
    Bytes { content_type: String, data: Vec<u8> },
    /// A path local to the remote service's disk; terminal, nothing to fetch
    Unusable { path: String },
}

/// Canonicalize one raw output value. Matching is ordered:
///
/// 1. string with an `http(s)` prefix is a URL
/// 2. string that is a data URI or a bare base64 payload is decoded to bytes
/// 3. object with a string `url` field is a URL
/// 4. object with a `path` but no usable URL is unusable (the path names the
///    remote host's disk, never ours)
/// 5. anything else is unrecognized
///
/// Canonical URLs are a fixed point: feeding a previously produced URL string
/// back through yields the same URL.
pub fn image_output(raw: &Value) -> Result<ImageOutput, NormalizeError> {
    if let Some(s) = raw.as_str() {
        let text = s.trim();
        if text.starts_with("http://") || text.starts_with("https://") {
            return Ok(ImageOutput::Url(text.to_string()));
        }
        if let Some(rest) = text.strip_prefix("data:") {
            return decode_data_uri(rest);
        }
        if looks_like_base64(text) {
            if let Ok(data) = STANDARD.decode(text) {
                // Bare payloads carry no media type; PNG is what the hosted
                // models emit when they fall back to raw base64
                return Ok(ImageOutput::Bytes {
                    content_type: "image/png".to_string(),
                    data,
                });
            }
        }
        return Err(unrecognized("string output is neither a URL nor image data"));
    }

    if let Some(obj) = raw.as_object() {
        if let Some(url) = obj.get("url").and_then(Value::as_str) {
            return Ok(ImageOutput::Url(url.to_string()));
        }
        if let Some(path) = obj.get("path").and_then(Value::as_str) {
            return Ok(ImageOutput::Unusable { path: path.to_string() });
        }
        return Err(unrecognized("object output carries neither url nor path"));
    }

    Err(unrecognized(format!("unsupported output type: {}", value_kind(raw))))
}

/// Split `<meta>,<payload>` from a data URI body and decode the payload.
/// The media type is the first `;`-separated meta segment, `image/png` when
/// the URI does not name one.
fn decode_data_uri(rest: &str) -> Result<ImageOutput, NormalizeError> {
    let mut parts = rest.splitn(2, ',');
    let meta = parts.next().unwrap_or_default();
    let payload = parts.next().unwrap_or_default();

    let media_type = meta.split(';').next().unwrap_or_default();
    let content_type = if media_type.is_empty() { "image/png" } else { media_type };

    let data = STANDARD
        .decode(payload)
        .map_err(|e| unrecognized(format!("data URI payload is not valid base64: {e}")))?;

    Ok(ImageOutput::Bytes {
        content_type: content_type.to_string(),
        data,
    })
}

/// Cheap pre-check before attempting a bare base64 decode. Short strings and
/// strings with characters outside the standard alphabet are plain text, not
/// image payloads.
fn looks_like_base64(text: &str) -> bool {
    text.len() >= 16
        && text.len() % 4 == 0
        && text.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extract a category label from a classifier output.
///
/// The rule is narrower than [`image_output`]: a plain string is the label
/// itself, an object may carry it under `label` or `category` with `label`
/// preferred. Labels are lowercased before persistence. Anything else falls
/// back to [`DEFAULT_CATEGORY`] rather than failing, so classification can
/// degrade without blocking an upload.
pub fn category_label(raw: Option<&Value>) -> String {
    let Some(value) = raw else {
        return DEFAULT_CATEGORY.to_string();
    };

    if let Some(label) = value.as_str() {
        return label.to_lowercase();
    }

    if let Some(obj) = value.as_object() {
        if let Some(label) = obj.get("label").or_else(|| obj.get("category")).and_then(Value::as_str) {
            return label.to_lowercase();
        }
    }

    DEFAULT_CATEGORY.to_string()
}
