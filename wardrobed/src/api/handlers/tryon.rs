use axum::{
    Json,
    extract::{Multipart, State},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;

use crate::AppState;
use crate::api::handlers::forms::collect_form;
use crate::api::models::tryon::{TryOnImages, TryOnParams, TryOnResponse};
use crate::errors::{Error, Result};
use crate::gateway::normalize::{ImageOutput, image_output};
use crate::gateway::{GatewayInputs, GatewayValue};

/// Compose a person photo with a garment image via the try-on model.
///
/// The gateway answers with an ordered batch: generated image, mask, dense
/// pose. Each of the three is normalized independently; one unusable slot
/// becomes `null` without dropping the others. Fewer than three outputs
/// means the model run itself went wrong and is reported as a server error.
pub async fn run_try_on(State(state): State<AppState>, multipart: Multipart) -> Result<Json<TryOnResponse>> {
    let mut form = collect_form(multipart).await?;
    let person = form.take_file("person_image")?;
    let garment = form.take_file("garment_image")?;

    let defaults = TryOnParams::default();
    let params = TryOnParams {
        steps: form.parse_or("steps", defaults.steps)?,
        scale: form.parse_or("scale", defaults.scale)?,
        seed: form.parse_or("seed", defaults.seed)?,
        accelerate: form.parse_or("accelerate", defaults.accelerate)?,
        repaint: form.parse_or("repaint", defaults.repaint)?,
    };

    let session = state.gateway.connect(&state.config.gateway.try_on).await?;
    let inputs = GatewayInputs::new()
        .push("person_image", person.to_gateway_value())
        .push("garment_image", garment.to_gateway_value())
        .push("steps", GatewayValue::Int(params.steps))
        .push("scale", GatewayValue::Float(params.scale))
        .push("seed", GatewayValue::Int(params.seed))
        .push("accelerate", GatewayValue::Bool(params.accelerate))
        .push("repaint", GatewayValue::Bool(params.repaint));
    let result = session.invoke(inputs).await?;

    let outputs = result.outputs();
    if outputs.len() < 3 {
        return Err(Error::UnrecognizedOutput {
            detail: format!("expected 3 generated images, got {}", outputs.len()),
        });
    }

    let data = TryOnImages {
        generated_image: presentable(&outputs[0], "image"),
        generated_mask: presentable(&outputs[1], "mask"),
        generated_dense_pose: presentable(&outputs[2], "dense pose"),
    };

    tracing::info!(
        image = data.generated_image.is_some(),
        mask = data.generated_mask.is_some(),
        dense_pose = data.generated_dense_pose.is_some(),
        "try-on run complete"
    );

    Ok(Json(TryOnResponse { success: true, data }))
}

/// One try-on output slot, as a string the caller can render directly.
/// Unusable or unrecognized slots degrade to `None` so the remaining slots
/// still reach the caller.
fn presentable(raw: &Value, slot: &str) -> Option<String> {
    match image_output(raw) {
        Ok(ImageOutput::Url(url)) => Some(url),
        Ok(ImageOutput::Bytes { content_type, data }) => Some(format!("data:{content_type};base64,{}", STANDARD.encode(data))),
        Ok(ImageOutput::Unusable { path }) => {
            tracing::warn!(slot, %path, "try-on output is not publicly addressable");
            None
        }
        Err(e) => {
            tracing::warn!(slot, error = %e, "dropping unrecognized try-on output");
            None
        }
    }
}
