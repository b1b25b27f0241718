use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::AppState;
use crate::api::handlers::forms::collect_form;
use crate::api::handlers::media::fetch_image;
use crate::errors::{Error, Result};
use crate::gateway::GatewayInputs;
use crate::gateway::normalize::{ImageOutput, image_output};

/// Strip the background from an uploaded image and stream the result back.
///
/// Nothing is persisted here; the transformed image travels to the caller as
/// a binary attachment. Unlike categorization, a gateway failure on this
/// route is fatal and reported as service-unavailable. When the gateway
/// answers with a URL instead of bytes, the image is fetched on the caller's
/// behalf so the response is always the image itself.
pub async fn remove_background(State(state): State<AppState>, multipart: Multipart) -> Result<Response> {
    let mut form = collect_form(multipart).await?;
    let image = form.take_file("image")?;

    let session = state.gateway.connect(&state.config.gateway.background_removal).await?;
    let result = session.invoke(GatewayInputs::new().push("image", image.to_gateway_value())).await?;

    let first = result.first().ok_or_else(|| Error::UnrecognizedOutput {
        detail: "gateway returned no outputs".to_string(),
    })?;

    let (bytes, content_type) = match image_output(first) {
        Ok(ImageOutput::Url(url)) => {
            let (bytes, ct) = fetch_image(&state.http, &url).await?;
            (bytes, ct.unwrap_or_else(|| "image/png".to_string()))
        }
        Ok(ImageOutput::Bytes { content_type, data }) => (Bytes::from(data), content_type),
        Ok(ImageOutput::Unusable { path }) => {
            return Err(Error::UnrecognizedOutput {
                detail: format!("output names a file on the remote host: {path}"),
            });
        }
        Err(e) => return Err(Error::UnrecognizedOutput { detail: e.to_string() }),
    };

    tracing::info!(bytes = bytes.len(), content_type = %content_type, "background removal complete");

    let disposition = format!("attachment; filename=\"{}\"", attachment_filename(&image.filename));
    Ok(([(header::CONTENT_TYPE, content_type), (header::CONTENT_DISPOSITION, disposition)], bytes).into_response())
}

/// Attachment name advertised to the caller, restricted to characters that
/// are safe inside a quoted Content-Disposition filename
fn attachment_filename(original: &str) -> String {
    let stem: String = original
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "image".to_string() } else { stem };
    format!("no-background-{stem}")
}
