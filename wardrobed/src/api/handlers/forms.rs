//! Multipart form collection shared by the upload handlers.
//!
//! The upload routes all speak `multipart/form-data` with a small, fixed set
//! of file and text fields. Parts are drained into memory up front (bounded
//! by the router's body limit) so handlers can validate everything before
//! causing any side effect.

use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;

use crate::errors::{Error, Result};
use crate::gateway::GatewayValue;

/// One uploaded file part
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// The gateway input form of this upload
    pub fn to_gateway_value(&self) -> GatewayValue {
        GatewayValue::Blob {
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
            bytes: self.bytes.clone(),
        }
    }
}

/// A drained multipart form: file parts and text parts by field name.
/// Unknown fields are kept around but handlers simply never take them.
#[derive(Debug, Default)]
pub struct CollectedForm {
    files: HashMap<String, UploadedFile>,
    texts: HashMap<String, String>,
}

impl CollectedForm {
    /// Required file part; absent or empty is a validation error
    pub fn take_file(&mut self, name: &str) -> Result<UploadedFile> {
        let file = self.files.remove(name).ok_or_else(|| Error::Validation {
            message: format!("Missing required field: '{name}'"),
        })?;
        if file.bytes.is_empty() {
            return Err(Error::Validation {
                message: format!("Field '{name}' is empty"),
            });
        }
        Ok(file)
    }

    /// Required text part
    pub fn take_text(&mut self, name: &str) -> Result<String> {
        match self.texts.remove(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::Validation {
                message: format!("Missing required field: '{name}'"),
            }),
        }
    }

    /// Optional text part parsed into `T`. Absent yields `default`; present
    /// but malformed is a validation error.
    pub fn parse_or<T: std::str::FromStr>(&mut self, name: &str, default: T) -> Result<T> {
        match self.texts.remove(name) {
            Some(raw) => raw.trim().parse::<T>().map_err(|_| Error::Validation {
                message: format!("Invalid value for '{name}': '{raw}'"),
            }),
            None => Ok(default),
        }
    }
}

/// Drain a multipart stream into a [`CollectedForm`].
///
/// Parts carrying a filename are file parts; their content type falls back
/// to a filename-based guess when the client omits it. Everything else is
/// collected as text.
pub async fn collect_form(mut multipart: Multipart) -> Result<CollectedForm> {
    let mut form = CollectedForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::Validation {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let name = field.name().unwrap_or("").to_string();

        if let Some(filename) = field.file_name() {
            let filename = filename.to_string();
            let content_type = match field.content_type() {
                Some(ct) => ct.to_string(),
                None => mime_guess::from_path(&filename).first_or_octet_stream().essence_str().to_string(),
            };
            let bytes = field.bytes().await.map_err(|e| Error::Validation {
                message: format!("Failed to read field '{name}': {e}"),
            })?;
            form.files.insert(
                name,
                UploadedFile {
                    filename,
                    content_type,
                    bytes,
                },
            );
        } else {
            let value = field.text().await.map_err(|e| Error::Validation {
                message: format!("Failed to read field '{name}': {e}"),
            })?;
            form.texts.insert(name, value);
        }
    }

    Ok(form)
}
